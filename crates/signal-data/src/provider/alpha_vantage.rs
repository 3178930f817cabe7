//! Alpha Vantage 원자재 가격 어댑터.
//!
//! `GET /query?function={WTI|BRENT|COPPER|NATURAL_GAS}&interval=...`
//!
//! 응답의 `data` 배열은 최신순이며 값이 없는 날은 `"."`로 표시됩니다.
//! 한도 초과 시 Alpha Vantage는 HTTP 200과 함께 `Information`/`Note`
//! 본문을 반환하므로 이를 파싱 오류로 취급합니다.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::str::FromStr;

use signal_core::{EntityKind, EventType, NormalizedEvent, SourceKind, TrackedEntity};

use super::client::{ClientSettings, ProviderClient};
use super::{parse_provider_time, ProviderAdapter};
use crate::error::{ProviderError, Result};

/// Alpha Vantage 기본 URL.
pub const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

const PROVIDER: &str = "alpha_vantage";

/// 원자재 심볼 → (API function, interval, 섹터).
const COMMODITIES: &[(&str, &str, Option<&str>)] = &[
    ("WTI", "daily", Some("Energy")),
    ("BRENT", "daily", Some("Energy")),
    ("NATURAL_GAS", "daily", Some("Energy")),
    // 구리는 월간 데이터만 제공
    ("COPPER", "monthly", None),
];

#[derive(Debug, Deserialize)]
struct CommodityResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    data: Option<Vec<DataPoint>>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    date: String,
    value: String,
}

/// Alpha Vantage 원자재 가격 어댑터.
pub struct AlphaVantageCommodityAdapter {
    client: ProviderClient,
    api_key: Option<SecretString>,
}

impl AlphaVantageCommodityAdapter {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        settings: &ClientSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: ProviderClient::new(PROVIDER, base_url, settings)?,
            api_key: api_key.filter(|key| !key.expose_secret().trim().is_empty()),
        })
    }

    /// 지원하는 원자재 심볼.
    pub fn supported() -> impl Iterator<Item = &'static str> {
        COMMODITIES.iter().map(|(symbol, _, _)| *symbol)
    }

    fn lookup(symbol: &str) -> Option<(&'static str, &'static str, Option<&'static str>)> {
        COMMODITIES
            .iter()
            .find(|(s, _, _)| s.eq_ignore_ascii_case(symbol))
            .copied()
    }
}

/// 최신 두 값으로 변동률(%)을 계산합니다.
fn change_pct(latest: Decimal, previous: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    ((latest - previous) / previous * Decimal::ONE_HUNDRED).to_f64()
}

fn into_event(
    symbol: &str,
    sector: Option<&str>,
    response: CommodityResponse,
) -> Result<Option<NormalizedEvent>> {
    if let Some(message) = response
        .information
        .or(response.note)
        .or(response.error_message)
    {
        return Err(ProviderError::parse(PROVIDER, message));
    }

    let data = response
        .data
        .ok_or_else(|| ProviderError::parse(PROVIDER, "data 필드 없음"))?;

    let mut points = data.iter().filter_map(|point| {
        let value = point.value.trim();
        if value == "." {
            return None;
        }
        Decimal::from_str(value).ok().map(|price| (point, price))
    });

    let Some((latest, price)) = points.next() else {
        return Ok(None);
    };

    let mut event = NormalizedEvent::new(symbol, EventType::CommodityPrice)
        .with_price(price)
        .with_occurred_at(parse_provider_time(&latest.date));

    let description = match points.next().and_then(|(_, prev)| change_pct(price, prev)) {
        Some(pct) => {
            event = event.with_change_pct(pct);
            format!("{} {} ({:+.2}%)", symbol, price, pct)
        }
        None => format!("{} {}", symbol, price),
    };
    event = event.with_description(description, usize::MAX);

    if let Some(name) = response.name {
        event = event.with_title(name);
    }
    if let Some(sector) = sector {
        event = event.with_sector(sector);
    }

    Ok(Some(event))
}

#[async_trait]
impl ProviderAdapter for AlphaVantageCommodityAdapter {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn source(&self) -> SourceKind {
        SourceKind::CommodityPrice
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Commodity && Self::lookup(entity.id()).is_some()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn remaining_budget(&self) -> Option<u32> {
        Some(self.client.budget().remaining())
    }

    fn reset_budget(&self) {
        self.client.budget().reset();
    }

    async fn try_fetch(&self, entity: &TrackedEntity) -> Result<Vec<NormalizedEvent>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ProviderError::Unconfigured(PROVIDER))?;
        let (function, interval, sector) = Self::lookup(entity.id())
            .ok_or_else(|| ProviderError::parse(PROVIDER, format!("지원하지 않는 원자재: {}", entity)))?;

        let response: CommodityResponse = self
            .client
            .get_json(
                "/query",
                &[
                    ("function", function),
                    ("interval", interval),
                    ("apikey", api_key.expose_secret()),
                ],
                &[],
            )
            .await?;

        Ok(into_event(function, sector, response)?.into_iter().collect())
    }
}
