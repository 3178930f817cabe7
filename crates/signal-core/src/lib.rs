//! # Signal Core
//!
//! 시그널 수집 파이프라인의 핵심 도메인 모델과 분류기를 제공합니다.
//!
//! 이 크레이트는 네트워크/DB I/O 없이 다음을 제공합니다:
//! - 추적 대상(심볼/섹터/원자재) 및 정규화된 이벤트 타입
//! - 시그널/심각도 분류 체계
//! - 순서가 있는 규칙 기반 분류기
//! - 정적 유니버스 테이블 (CIK 매핑, 섹터 구성 종목, 섹터 ETF)
//! - 에러 타입과 로깅 인프라

pub mod classifier;
pub mod domain;
pub mod error;
pub mod logging;
pub mod universe;

pub use classifier::{Classifier, ClassifierThresholds, Rule, RuleKind};
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use universe::{
    RegulatorIds, SectorConstituents, SectorEtfs, Universe, UNKNOWN_FILER_CIK,
};
