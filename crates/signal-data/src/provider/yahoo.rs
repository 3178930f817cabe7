//! Yahoo Finance 섹터 ETF 어댑터.
//!
//! 섹터를 추종하는 ETF의 최근 5일 일봉에서 마지막 두 종가로 일간 변동률을
//! 계산합니다. API 키가 필요 없습니다.
//!
//! 시세 조회는 `QuoteSource` 트레이트 뒤에 있어 테스트에서 교체할 수 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;
use yahoo_finance_api as yahoo;

use signal_core::{EntityKind, EventType, NormalizedEvent, SectorEtfs, SourceKind, TrackedEntity};

use super::client::{with_retry, ClientSettings, RequestBudget, RetryPolicy};
use super::ProviderAdapter;
use crate::error::{ProviderError, Result};

const PROVIDER: &str = "yahoo";

/// 일봉 종가 하나.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub at: Option<DateTime<Utc>>,
    pub close: f64,
}

/// 일봉 종가 조회.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// 최근 일봉 종가 (오래된 것부터).
    async fn daily_closes(&self, symbol: &str) -> Result<Vec<DailyClose>>;

    /// 남은 요청 예산.
    fn remaining_budget(&self) -> Option<u32> {
        None
    }

    /// 실행 시작 시 요청 예산을 되돌립니다.
    fn reset_budget(&self) {}
}

/// Yahoo Finance 시세 소스.
pub struct YahooQuoteSource {
    connector: yahoo::YahooConnector,
    retry: RetryPolicy,
    budget: RequestBudget,
}

impl YahooQuoteSource {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let connector = yahoo::YahooConnector::new().map_err(|e| ProviderError::Transport {
            provider: PROVIDER,
            message: format!("{}", e),
        })?;

        Ok(Self {
            connector,
            retry: settings.retry.clone(),
            budget: RequestBudget::new(settings.request_budget),
        })
    }

    async fn fetch_quotes(&self, symbol: &str) -> Result<Vec<yahoo::Quote>> {
        // 주말을 고려해 최근 5일 조회
        let response = self
            .connector
            .get_quote_range(symbol, "1d", "5d")
            .await
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER,
                message: format!("{}: {}", symbol, e),
            })?;

        let quotes = response
            .quotes()
            .map_err(|e| ProviderError::parse(PROVIDER, format!("{}: {}", symbol, e)))?;

        debug!(symbol, count = quotes.len(), "Yahoo 캔들 수신");
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn daily_closes(&self, symbol: &str) -> Result<Vec<DailyClose>> {
        let quotes = with_retry(PROVIDER, &self.retry, &self.budget, || {
            self.fetch_quotes(symbol)
        })
        .await?;

        Ok(quotes
            .into_iter()
            .map(|quote| DailyClose {
                at: i64::try_from(quote.timestamp)
                    .ok()
                    .and_then(|ts| DateTime::from_timestamp(ts, 0)),
                close: quote.close,
            })
            .collect())
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.budget.remaining())
    }

    fn reset_budget(&self) {
        self.budget.reset();
    }
}

/// 섹터 ETF 성과 어댑터.
pub struct SectorEtfAdapter {
    quotes: Arc<dyn QuoteSource>,
    etfs: Arc<SectorEtfs>,
}

impl SectorEtfAdapter {
    pub fn new(quotes: Arc<dyn QuoteSource>, etfs: Arc<SectorEtfs>) -> Self {
        Self { quotes, etfs }
    }
}

/// 두 종가 사이의 변동률(%).
fn change_pct(latest: f64, previous: f64) -> Option<f64> {
    (previous != 0.0 && previous.is_finite() && latest.is_finite())
        .then(|| (latest - previous) / previous * 100.0)
}

#[async_trait]
impl ProviderAdapter for SectorEtfAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn source(&self) -> SourceKind {
        SourceKind::SectorPerformance
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Sector && self.etfs.etf_for_sector(entity.id()).is_some()
    }

    fn remaining_budget(&self) -> Option<u32> {
        self.quotes.remaining_budget()
    }

    fn reset_budget(&self) {
        self.quotes.reset_budget();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        let sector = entity.id();
        let etf = self
            .etfs
            .etf_for_sector(sector)
            .ok_or_else(|| ProviderError::parse(PROVIDER, format!("섹터 ETF 없음: {}", sector)))?;

        let closes = self.quotes.daily_closes(etf).await?;
        let Some(latest) = closes.last() else {
            return Ok(Vec::new());
        };

        let mut event = NormalizedEvent::new(sector, EventType::SectorPerformance)
            .with_sector(sector)
            .with_title(etf)
            .with_occurred_at(latest.at);

        if let Some(price) = Decimal::from_f64_retain(latest.close) {
            event = event.with_price(price.round_dp(4));
        }

        let previous = closes.len().checked_sub(2).and_then(|idx| closes.get(idx));
        let description = match previous.and_then(|prev| change_pct(latest.close, prev.close)) {
            Some(pct) => {
                event = event.with_change_pct(pct);
                format!("{} sector ({}) {:+.2}%", sector, etf, pct)
            }
            None => format!("{} sector ({}) close {:.2}", sector, etf, latest.close),
        };

        Ok(vec![event.with_description(description, usize::MAX)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// 고정 종가를 돌려주는 시세 소스.
    #[derive(Default)]
    struct FixedQuotes {
        closes: HashMap<String, Vec<f64>>,
        requested: Mutex<Vec<String>>,
    }

    impl FixedQuotes {
        fn with(symbol: &str, closes: &[f64]) -> Self {
            let mut map = HashMap::new();
            map.insert(symbol.to_string(), closes.to_vec());
            Self {
                closes: map,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn daily_closes(&self, symbol: &str) -> Result<Vec<DailyClose>> {
            self.requested.lock().unwrap().push(symbol.to_string());
            self.closes
                .get(symbol)
                .map(|closes| {
                    closes
                        .iter()
                        .map(|close| DailyClose { at: None, close: *close })
                        .collect()
                })
                .ok_or_else(|| ProviderError::Status {
                    provider: PROVIDER,
                    status: 404,
                    body: String::new(),
                })
        }
    }

    fn etfs() -> Arc<SectorEtfs> {
        Arc::new(SectorEtfs::new([("SOXX", "Semiconductor"), ("XLE", "Energy")]))
    }

    #[tokio::test]
    async fn test_change_from_last_two_closes() {
        let quotes = Arc::new(FixedQuotes::with("SOXX", &[200.0, 210.0, 200.0, 208.0]));
        let adapter = SectorEtfAdapter::new(quotes.clone(), etfs());

        let events = adapter
            .try_fetch(&TrackedEntity::sector("semiconductor"))
            .await
            .unwrap();

        assert_eq!(quotes.requested.lock().unwrap().as_slice(), ["SOXX"]);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type, EventType::SectorPerformance);
        assert_eq!(event.entity, "semiconductor");
        assert_eq!(event.title.as_deref(), Some("SOXX"));
        assert!((event.magnitude.change_pct.unwrap() - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_close_is_price_only() {
        let adapter = SectorEtfAdapter::new(Arc::new(FixedQuotes::with("XLE", &[91.25])), etfs());

        let events = adapter.try_fetch(&TrackedEntity::sector("Energy")).await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].magnitude.change_pct, None);
        assert!(events[0].magnitude.price.is_some());
    }

    #[tokio::test]
    async fn test_no_closes_and_failures() {
        let adapter = SectorEtfAdapter::new(Arc::new(FixedQuotes::with("XLE", &[])), etfs());
        assert!(adapter
            .try_fetch(&TrackedEntity::sector("Energy"))
            .await
            .unwrap()
            .is_empty());

        // SOXX 시세 없음 → 오류는 fetch에서 빈 목록으로 강등
        assert!(adapter
            .fetch(&TrackedEntity::sector("Semiconductor"))
            .await
            .is_empty());
    }

    #[test]
    fn test_accepts_mapped_sectors_only() {
        let adapter = SectorEtfAdapter::new(Arc::new(FixedQuotes::default()), etfs());
        assert!(adapter.accepts(&TrackedEntity::sector("Energy")));
        assert!(!adapter.accepts(&TrackedEntity::sector("Healthcare")));
        assert!(!adapter.accepts(&TrackedEntity::symbol("XLE")));
    }

    #[tokio::test]
    #[ignore] // 실제 API 호출 필요
    async fn test_live_yahoo_sector_etf() {
        let source = YahooQuoteSource::new(&ClientSettings::default()).unwrap();
        let adapter = SectorEtfAdapter::new(Arc::new(source), Arc::new(SectorEtfs::new([("XLK", "Technology")])));

        let events = adapter.fetch(&TrackedEntity::sector("Technology")).await;
        for event in &events {
            println!("{:?}", event.description);
        }
    }
}
