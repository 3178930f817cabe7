//! 정규화된 이벤트.
//!
//! 모든 Provider 어댑터는 응답을 `NormalizedEvent`로 변환합니다.
//! `entity`와 `event_type`만 필수이며, 나머지 필드의 부재는 0이 아니라
//! "알 수 없음"으로 취급해야 합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 설명 필드의 기본 최대 길이 (문자 수).
pub const DEFAULT_DESCRIPTION_MAX_CHARS: usize = 500;

/// 어댑터 계열 (RunSummary 집계 키).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// 규제 공시 (SEC EDGAR)
    Filing,
    /// 내부자 매매
    InsiderTrade,
    /// 보도자료
    PressRelease,
    /// 원자재 시세
    CommodityPrice,
    /// 섹터 ETF 성과
    SectorPerformance,
    /// 정책 뉴스
    PolicyNews,
}

impl SourceKind {
    /// 전체 목록.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Filing,
        SourceKind::InsiderTrade,
        SourceKind::PressRelease,
        SourceKind::CommodityPrice,
        SourceKind::SectorPerformance,
        SourceKind::PolicyNews,
    ];

    /// 레이블 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filing => "FILING",
            Self::InsiderTrade => "INSIDER_TRADE",
            Self::PressRelease => "PRESS_RELEASE",
            Self::CommodityPrice => "COMMODITY_PRICE",
            Self::SectorPerformance => "SECTOR_PERFORMANCE",
            Self::PolicyNews => "POLICY_NEWS",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이벤트 유형.
///
/// 어댑터가 생성하는 유형은 닫힌 variant로, Provider가 직접 붙인 레이블
/// (예: `PRODUCT_RECALL`, `CEO_RESIGNATION`)은 `Other`로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Filing,
    InsiderBuying,
    InsiderSelling,
    PressRelease,
    CommodityPrice,
    SectorPerformance,
    PolicyNews,
    /// Provider 고유 레이블 (대문자로 정규화)
    Other(String),
}

impl EventType {
    /// 레이블 문자열.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Filing => "FILING",
            Self::InsiderBuying => "INSIDER_BUYING",
            Self::InsiderSelling => "INSIDER_SELLING",
            Self::PressRelease => "PRESS_RELEASE",
            Self::CommodityPrice => "COMMODITY_PRICE",
            Self::SectorPerformance => "SECTOR_PERFORMANCE",
            Self::PolicyNews => "POLICY_NEWS",
            Self::Other(label) => label,
        }
    }

    /// 레이블을 파싱합니다. 알 수 없는 레이블은 `Other`가 됩니다.
    pub fn parse(label: &str) -> Self {
        let upper = label.trim().to_uppercase();
        match upper.as_str() {
            "FILING" => Self::Filing,
            "INSIDER_BUYING" => Self::InsiderBuying,
            "INSIDER_SELLING" => Self::InsiderSelling,
            "PRESS_RELEASE" => Self::PressRelease,
            "COMMODITY_PRICE" => Self::CommodityPrice,
            "SECTOR_PERFORMANCE" => Self::SectorPerformance,
            "POLICY_NEWS" => Self::PolicyNews,
            _ => Self::Other(upper),
        }
    }

    /// 이 유형을 생성하는 어댑터 계열.
    pub fn source_kind(&self) -> Option<SourceKind> {
        match self {
            Self::Filing => Some(SourceKind::Filing),
            Self::InsiderBuying | Self::InsiderSelling => Some(SourceKind::InsiderTrade),
            Self::PressRelease => Some(SourceKind::PressRelease),
            Self::CommodityPrice => Some(SourceKind::CommodityPrice),
            Self::SectorPerformance => Some(SourceKind::SectorPerformance),
            Self::PolicyNews => Some(SourceKind::PolicyNews),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for EventType {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for EventType {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이벤트 유형별 수치 필드.
///
/// 소스가 제공하는 경우에만 채워집니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Magnitude {
    /// 거래 주식 수 (내부자 매매)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<i64>,
    /// 가격 (내부자 매매 단가, ETF/원자재 종가)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// 전일 대비 변동률 (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
}

/// 모든 어댑터가 생성하는 공통 이벤트 형태.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// 심볼 또는 섹터
    pub entity: String,
    /// 이벤트 유형
    pub event_type: EventType,
    /// Provider 제공 본문 (최대 길이로 절단됨)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 발생 시각 (소스에 없으면 수집 시각)
    pub occurred_at: DateTime<Utc>,
    /// 수치 필드
    #[serde(default)]
    pub magnitude: Magnitude,
    /// 관련 섹터
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// 제목 (보도자료, 뉴스, ETF 심볼)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// 원문 링크
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NormalizedEvent {
    /// 필수 필드만으로 이벤트를 생성합니다. `occurred_at`은 현재 시각입니다.
    pub fn new(entity: impl Into<String>, event_type: impl Into<EventType>) -> Self {
        Self {
            entity: entity.into(),
            event_type: event_type.into(),
            description: None,
            occurred_at: Utc::now(),
            magnitude: Magnitude::default(),
            sector: None,
            title: None,
            url: None,
        }
    }

    /// 본문을 `max_chars` 문자로 절단해 설정합니다. 빈 본문은 무시합니다.
    pub fn with_description(mut self, text: impl AsRef<str>, max_chars: usize) -> Self {
        let text = text.as_ref().trim();
        if !text.is_empty() {
            self.description = Some(truncate_chars(text, max_chars));
        }
        self
    }

    /// 발생 시각을 설정합니다. `None`이면 수집 시각을 유지합니다.
    pub fn with_occurred_at(mut self, occurred_at: Option<DateTime<Utc>>) -> Self {
        if let Some(at) = occurred_at {
            self.occurred_at = at;
        }
        self
    }

    pub fn with_shares(mut self, shares: i64) -> Self {
        self.magnitude.shares = Some(shares);
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.magnitude.price = Some(price);
        self
    }

    pub fn with_change_pct(mut self, change_pct: f64) -> Self {
        self.magnitude.change_pct = Some(change_pct);
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = Some(title);
        }
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// 섹터 규칙 평가에 쓰이는 섹터.
    ///
    /// 명시된 섹터가 없고 섹터 성과 이벤트이면 대상 자체가 섹터입니다.
    pub fn effective_sector(&self) -> Option<&str> {
        match (&self.sector, &self.event_type) {
            (Some(sector), _) => Some(sector.as_str()),
            (None, EventType::SectorPerformance) => Some(self.entity.as_str()),
            _ => None,
        }
    }
}

/// 문자 경계를 지키며 최대 `max_chars` 문자로 자릅니다.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
