//! 분류된 트레이딩 시그널.
//!
//! - `Severity` - 시그널 긴급도 (LOW < MEDIUM < HIGH < CRITICAL)
//! - `Signal` - 시그널 레이블 (닫힌 집합, `Unclassified` 포함)
//! - `ClassifiedSignal` - 분류기 출력

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::event::{EventType, NormalizedEvent};
use crate::error::CoreError;

/// 시그널의 긴급도.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_label("severity", s))
    }
}

/// 트레이딩 관점의 시그널 레이블.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// 제품 리콜 → 즉시 매도
    ImmediateSell,
    /// CEO 사임 → 단기 하락
    ShortTermDown,
    /// M&A 발표
    MaAnnouncement,
    /// 내부자 대량 매수
    InsiderStrongBuy,
    /// 반도체 섹터 랠리
    SemiconductorRally,
    /// 에너지 섹터 급등
    EnergySectorSurge,
    /// 기술주 매도세
    TechSelloff,
    /// 어떤 규칙에도 해당하지 않음 (저장하지 않음)
    Unclassified,
}

impl Signal {
    pub const ALL: [Signal; 8] = [
        Signal::ImmediateSell,
        Signal::ShortTermDown,
        Signal::MaAnnouncement,
        Signal::InsiderStrongBuy,
        Signal::SemiconductorRally,
        Signal::EnergySectorSurge,
        Signal::TechSelloff,
        Signal::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmediateSell => "IMMEDIATE_SELL",
            Self::ShortTermDown => "SHORT_TERM_DOWN",
            Self::MaAnnouncement => "MA_ANNOUNCEMENT",
            Self::InsiderStrongBuy => "INSIDER_STRONG_BUY",
            Self::SemiconductorRally => "SEMICONDUCTOR_RALLY",
            Self::EnergySectorSurge => "ENERGY_SECTOR_SURGE",
            Self::TechSelloff => "TECH_SELLOFF",
            Self::Unclassified => "UNCLASSIFIED",
        }
    }

    /// 섹터 단위 시그널인지 확인합니다 (구성 종목으로 확산됨).
    pub fn is_sector_level(&self) -> bool {
        matches!(
            self,
            Self::SemiconductorRally | Self::EnergySectorSurge | Self::TechSelloff
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::invalid_label("signal", s))
    }
}

/// 분류기가 이벤트에서 도출한 시그널.
///
/// `signal`이 `Unclassified`가 아닌 행만 저장됩니다. 저장 후에는
/// 추가 전용이며 갱신/삭제 경로는 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSignal {
    /// 심볼 또는 섹터
    pub entity: String,
    /// 원본 이벤트 유형
    pub event_type: EventType,
    /// 시그널 레이블
    pub signal: Signal,
    /// 긴급도
    pub severity: Severity,
    /// 영향받는 심볼 집합
    pub affected_entities: BTreeSet<String>,
    /// 원본 이벤트 본문
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 원본 이벤트 발생 시각
    pub occurred_at: DateTime<Utc>,
}

impl ClassifiedSignal {
    /// 이벤트의 식별 필드를 이어받아 시그널을 생성합니다.
    pub fn from_event(event: &NormalizedEvent, signal: Signal, severity: Severity) -> Self {
        Self {
            entity: event.entity.clone(),
            event_type: event.event_type.clone(),
            signal,
            severity,
            affected_entities: BTreeSet::new(),
            description: event.description.clone(),
            occurred_at: event.occurred_at,
        }
    }

    /// 분류되지 않은 결과를 생성합니다 (심각도 기본값 MEDIUM).
    pub fn unclassified(event: &NormalizedEvent) -> Self {
        Self::from_event(event, Signal::Unclassified, Severity::default())
    }

    pub fn with_affected<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_entities
            .extend(entities.into_iter().map(Into::into));
        self
    }

    /// 저장 대상 시그널인지 확인합니다.
    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!(Severity::default(), Severity::Medium);
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("MA_ANNOUNCEMENT".parse::<Signal>().unwrap(), Signal::MaAnnouncement);
        assert!("MAYBE_SELL".parse::<Signal>().is_err());
    }

    #[test]
    fn test_signal_serializes_screaming_snake() {
        let json = serde_json::to_string(&Signal::InsiderStrongBuy).unwrap();
        assert_eq!(json, "\"INSIDER_STRONG_BUY\"");
        let json = serde_json::to_string(&Severity::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
    }

    #[test]
    fn test_unclassified_is_not_actionable() {
        let event = NormalizedEvent::new("AAPL", EventType::PressRelease);
        let signal = ClassifiedSignal::unclassified(&event);

        assert!(!signal.is_actionable());
        assert_eq!(signal.severity, Severity::Medium);
        assert!(signal.affected_entities.is_empty());
    }
}
