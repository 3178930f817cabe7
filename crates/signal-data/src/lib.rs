//! 외부 데이터 Provider 어댑터와 시그널 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - Provider별 어댑터 (SEC EDGAR, FMP, Alpha Vantage, Yahoo Finance, NewsAPI)
//! - 재시도/요청 예산을 적용하는 공용 HTTP 클라이언트
//! - 시그널 저장소 (PostgreSQL, 로그 전용)

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{ProviderError, Result};

// Provider 재내보내기
pub use provider::{
    AdapterSettings, AlphaVantageCommodityAdapter, ClientSettings, DailyClose, FetchOutcome,
    FmpApi, FmpInsiderTradeAdapter, FmpPressReleaseAdapter, PolicyNewsAdapter, ProviderAdapter,
    ProviderClient, QuoteSource, RequestBudget, RetryPolicy, SecFilingsAdapter, SectorEtfAdapter,
    YahooQuoteSource,
};
pub use provider::alpha_vantage::ALPHA_VANTAGE_BASE_URL;
pub use provider::fmp::FMP_BASE_URL;
pub use provider::news_api::NEWS_API_BASE_URL;
pub use provider::sec_edgar::SEC_BASE_URL;

// 저장소 재내보내기
pub use storage::{LogSink, PgSignalStore, SignalSink, SinkTable, StoredSignal};
