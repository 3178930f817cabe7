//! 데이터 Provider 모듈.
//!
//! 외부 소스 하나당 어댑터 하나가 응답을 `NormalizedEvent` 목록으로 변환합니다.
//!
//! ## 규제 공시
//! - `SecFilingsAdapter`: SEC EDGAR submissions API (8-K, 10-K, 10-Q)
//!
//! ## FMP (Financial Modeling Prep)
//! - `FmpInsiderTradeAdapter`: 내부자 매매 (P/S 코드만 유지)
//! - `FmpPressReleaseAdapter`: 보도자료
//!
//! ## 시세
//! - `AlphaVantageCommodityAdapter`: 원자재 가격 (WTI, BRENT, 구리, 천연가스 등)
//! - `SectorEtfAdapter`: Yahoo Finance 섹터 ETF 일간 성과
//!
//! ## 뉴스
//! - `PolicyNewsAdapter`: NewsAPI 기반 섹터별 정책 뉴스
//!
//! # 부분 실패 정책
//!
//! (대상, 소스) 쌍마다 독립적으로 실패합니다. `ProviderAdapter::fetch`는
//! 어떤 오류도 전파하지 않고 로그를 남긴 뒤 빈 목록을 반환합니다.

pub mod alpha_vantage;
pub mod client;
pub mod fmp;
pub mod news_api;
pub mod sec_edgar;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageCommodityAdapter;
pub use client::{ClientSettings, ProviderClient, RequestBudget, RetryPolicy};
pub use fmp::{FmpApi, FmpInsiderTradeAdapter, FmpPressReleaseAdapter};
pub use news_api::PolicyNewsAdapter;
pub use sec_edgar::SecFilingsAdapter;
pub use yahoo::{DailyClose, QuoteSource, SectorEtfAdapter, YahooQuoteSource};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, warn};

use signal_core::{NormalizedEvent, SourceKind, TrackedEntity, DEFAULT_DESCRIPTION_MAX_CHARS};

use crate::error::ProviderError;

/// 어댑터 공통 설정.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// 조회 기간 (일)
    pub lookback_days: i64,
    /// 설명 필드 최대 문자 수
    pub description_max_chars: usize,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            description_max_chars: DEFAULT_DESCRIPTION_MAX_CHARS,
        }
    }
}

impl AdapterSettings {
    /// 조회 기간의 시작일.
    pub fn lookback_start(&self) -> NaiveDate {
        (Utc::now() - chrono::Duration::days(self.lookback_days)).date_naive()
    }
}

/// 어댑터 호출 결과.
#[derive(Debug)]
pub enum FetchOutcome {
    /// 조회 성공 (빈 목록도 정상)
    Collected(Vec<NormalizedEvent>),
    /// 조회 실패 (빈 결과로 강등)
    Failed(ProviderError),
    /// 자격증명이 없어 건너뜀
    Unconfigured,
}

impl FetchOutcome {
    /// 이벤트 목록으로 변환합니다. 실패는 빈 목록입니다.
    pub fn into_events(self) -> Vec<NormalizedEvent> {
        match self {
            Self::Collected(events) => events,
            Self::Failed(_) | Self::Unconfigured => Vec::new(),
        }
    }
}

/// 외부 Provider 어댑터.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// 로그/설정용 Provider 이름 (예: "sec_edgar")
    fn name(&self) -> &'static str;

    /// 생성하는 이벤트 계열
    fn source(&self) -> SourceKind;

    /// 이 대상을 처리하는지 여부
    fn accepts(&self, entity: &TrackedEntity) -> bool;

    /// 자격증명이 설정되었는지 여부
    fn is_configured(&self) -> bool {
        true
    }

    /// 남은 요청 예산 (예산이 없는 어댑터는 `None`)
    fn remaining_budget(&self) -> Option<u32> {
        None
    }

    /// 실행 시작 시 요청 예산을 되돌립니다.
    fn reset_budget(&self) {}

    /// 대상 하나를 조회합니다. 오류를 그대로 반환합니다.
    async fn try_fetch(
        &self,
        entity: &TrackedEntity,
    ) -> Result<Vec<NormalizedEvent>, ProviderError>;

    /// 대상 하나를 조회하고 결과를 분류합니다. 실패는 로그로 남깁니다.
    async fn fetch_outcome(&self, entity: &TrackedEntity) -> FetchOutcome {
        if !self.is_configured() {
            debug!(provider = self.name(), entity = %entity, "미설정 Provider, 건너뜀");
            return FetchOutcome::Unconfigured;
        }

        match self.try_fetch(entity).await {
            Ok(events) => {
                debug!(
                    provider = self.name(),
                    entity = %entity,
                    count = events.len(),
                    "조회 완료"
                );
                FetchOutcome::Collected(events)
            }
            Err(e) => {
                warn!(
                    provider = self.name(),
                    source = %self.source(),
                    entity = %entity,
                    error = %e,
                    "조회 실패, 빈 결과로 처리"
                );
                FetchOutcome::Failed(e)
            }
        }
    }

    /// 최선 노력 조회. 어떤 실패도 전파하지 않고 빈 목록을 반환합니다.
    async fn fetch(&self, entity: &TrackedEntity) -> Vec<NormalizedEvent> {
        self.fetch_outcome(entity).await.into_events()
    }
}

/// Provider가 보고한 날짜/시각 문자열을 파싱합니다.
///
/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` 형식을 지원합니다.
/// 파싱할 수 없으면 `None` (호출 측은 수집 시각을 사용).
pub fn parse_provider_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
