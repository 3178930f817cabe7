//! Financial Modeling Prep (FMP) 어댑터.
//!
//! ## 엔드포인트
//! - `/api/v4/insider-trading?symbol=...&limit=50`: 내부자 매매
//! - `/api/v3/press-releases/{symbol}?limit=10`: 보도자료
//!
//! 두 어댑터는 같은 API 키를 쓰므로 `FmpApi`를 공유해 요청 예산도
//! 함께 소모합니다.

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

use signal_core::{EntityKind, EventType, NormalizedEvent, SourceKind, TrackedEntity};

use super::client::{ClientSettings, ProviderClient};
use super::{parse_provider_time, AdapterSettings, ProviderAdapter};
use crate::error::{ProviderError, Result};

/// FMP API 기본 URL.
pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com";

const PROVIDER: &str = "fmp";

/// 대상당 유지할 최근 내부자 거래 수.
const MAX_INSIDER_TRADES: usize = 10;

/// FMP 클라이언트와 API 키.
#[derive(Debug, Clone)]
pub struct FmpApi {
    client: ProviderClient,
    api_key: Option<Arc<SecretString>>,
}

impl FmpApi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        settings: &ClientSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, base_url, settings)?,
            api_key: api_key
                .filter(|key| !key.expose_secret().trim().is_empty())
                .map(Arc::new),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::Unconfigured(PROVIDER))?;

        let mut params = query.to_vec();
        params.push(("apikey", api_key.expose_secret()));
        self.client.get_json(path, &params, &[]).await
    }
}

/// 내부자 거래 행.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsiderTradeRow {
    #[serde(default)]
    reporting_name: String,
    #[serde(default)]
    transaction_type: String,
    #[serde(default)]
    securities_transacted: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    filing_date: String,
    #[serde(default)]
    transaction_date: String,
}

/// 보도자료 행.
#[derive(Debug, Deserialize)]
struct PressReleaseRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    date: String,
}

/// 거래 유형 코드 (`"P-Purchase"` → `"P"`).
fn transaction_code(raw: &str) -> &str {
    raw.split('-').next().unwrap_or_default().trim()
}

/// 숫자 또는 숫자 문자열을 정수로 변환합니다. 그 외는 0.
fn coerce_shares(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim().replace(',', "");
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// 숫자 또는 숫자 문자열을 Decimal로 변환합니다. 그 외는 0.
fn coerce_price(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO),
        Value::String(s) => Decimal::from_str(s.trim()).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// FMP 내부자 매매 어댑터.
pub struct FmpInsiderTradeAdapter {
    api: FmpApi,
    settings: AdapterSettings,
}

impl FmpInsiderTradeAdapter {
    pub fn new(api: FmpApi, settings: AdapterSettings) -> Self {
        Self { api, settings }
    }

    fn normalize(&self, symbol: &str, rows: Vec<InsiderTradeRow>) -> Vec<NormalizedEvent> {
        rows.into_iter()
            .take(MAX_INSIDER_TRADES)
            .filter_map(|row| {
                let (event_type, verb) = match transaction_code(&row.transaction_type) {
                    "P" => (EventType::InsiderBuying, "bought"),
                    "S" => (EventType::InsiderSelling, "sold"),
                    _ => return None,
                };

                let shares = coerce_shares(&row.securities_transacted);
                let occurred_at = parse_provider_time(&row.filing_date)
                    .or_else(|| parse_provider_time(&row.transaction_date));

                Some(
                    NormalizedEvent::new(symbol, event_type)
                        .with_description(
                            format!("{} {} {} shares", row.reporting_name.trim(), verb, shares),
                            self.settings.description_max_chars,
                        )
                        .with_shares(shares)
                        .with_price(coerce_price(&row.price))
                        .with_occurred_at(occurred_at),
                )
            })
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for FmpInsiderTradeAdapter {
    fn name(&self) -> &'static str {
        "fmp_insider"
    }

    fn source(&self) -> SourceKind {
        SourceKind::InsiderTrade
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Symbol
    }

    fn is_configured(&self) -> bool {
        self.api.is_configured()
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.api.client.budget().remaining())
    }

    fn reset_budget(&self) {
        self.api.client.budget().reset();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        let symbol = entity.id();
        let rows: Vec<InsiderTradeRow> = self
            .api
            .get(
                "/api/v4/insider-trading",
                &[("symbol", symbol), ("limit", "50")],
            )
            .await?;

        Ok(self.normalize(symbol, rows))
    }
}

/// FMP 보도자료 어댑터.
pub struct FmpPressReleaseAdapter {
    api: FmpApi,
    settings: AdapterSettings,
}

impl FmpPressReleaseAdapter {
    pub fn new(api: FmpApi, settings: AdapterSettings) -> Self {
        Self { api, settings }
    }
}

#[async_trait]
impl ProviderAdapter for FmpPressReleaseAdapter {
    fn name(&self) -> &'static str {
        "fmp_press"
    }

    fn source(&self) -> SourceKind {
        SourceKind::PressRelease
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Symbol
    }

    fn is_configured(&self) -> bool {
        self.api.is_configured()
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.api.client.budget().remaining())
    }

    fn reset_budget(&self) {
        self.api.client.budget().reset();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        let symbol = entity.id();
        let path = format!("/api/v3/press-releases/{}", symbol);
        let rows: Vec<PressReleaseRow> = self.api.get(&path, &[("limit", "10")]).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                NormalizedEvent::new(symbol, EventType::PressRelease)
                    .with_title(row.title.trim())
                    .with_description(&row.text, self.settings.description_max_chars)
                    .with_occurred_at(parse_provider_time(&row.date))
            })
            .collect())
    }
}
