//! Multi-source financial signal collector.
//!
//! 이 crate는 외부 Provider에서 이벤트를 수집해 분류하고 저장하는
//! 바이너리를 제공합니다:
//! - 환경변수 기반 설정 (API 키, 동시성, 요청 예산, 분류 임계값)
//! - (대상, 소스) 쌍을 병렬로 조회하는 수집 오케스트레이터
//! - 실행 요약 (`RunSummary`)

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use orchestrator::{build_adapters, Orchestrator};
pub use stats::RunSummary;
