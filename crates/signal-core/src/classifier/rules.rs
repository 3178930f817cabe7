//! 분류 규칙 테이블.
//!
//! 각 규칙은 (조건, 결과) 쌍입니다. 테이블은 위에서부터 평가되며
//! 첫 번째로 일치하는 규칙만 결과를 냅니다.

use serde::{Deserialize, Serialize};

use crate::domain::{EventType, NormalizedEvent, Severity, Signal};

/// 규칙 조건의 종류.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// 본문 또는 이벤트 유형에 "recall" 포함 (본문은 "리콜"도 일치)
    Recall,
    /// 이벤트 유형에 "ceo"와 "resign" 포함
    CeoResignation,
    /// 본문 또는 이벤트 유형에 "m&a" 또는 "acquisition" 포함
    MergerAcquisition,
    /// 내부자 매수이며 주식 수가 임계값 초과
    InsiderBuyAbove { min_shares: i64 },
    /// 섹터 변동률이 임계값 초과
    SectorRiseAbove { sector: String, threshold_pct: f64 },
    /// 섹터 변동률이 임계값 미만
    SectorFallBelow { sector: String, threshold_pct: f64 },
}

impl RuleKind {
    /// 이벤트가 조건을 만족하는지 확인합니다.
    ///
    /// 비교 대상 필드가 없으면 불일치로 취급합니다.
    pub fn matches(&self, event: &NormalizedEvent) -> bool {
        match self {
            Self::Recall => {
                contains_ci(event.event_type.as_str(), "recall")
                    || event
                        .description
                        .as_deref()
                        .is_some_and(|d| RECALL_TERMS.iter().any(|term| contains_ci(d, term)))
            }
            Self::CeoResignation => {
                let event_type = event.event_type.as_str();
                contains_ci(event_type, "ceo") && contains_ci(event_type, "resign")
            }
            Self::MergerAcquisition => {
                let hit = |text: &str| contains_ci(text, "m&a") || contains_ci(text, "acquisition");
                hit(event.event_type.as_str()) || event.description.as_deref().is_some_and(hit)
            }
            Self::InsiderBuyAbove { min_shares } => {
                event.event_type == EventType::InsiderBuying
                    && event.magnitude.shares.is_some_and(|shares| shares > *min_shares)
            }
            Self::SectorRiseAbove {
                sector,
                threshold_pct,
            } => {
                sector_is(event, sector)
                    && event.magnitude.change_pct.is_some_and(|pct| pct > *threshold_pct)
            }
            Self::SectorFallBelow {
                sector,
                threshold_pct,
            } => {
                sector_is(event, sector)
                    && event.magnitude.change_pct.is_some_and(|pct| pct < *threshold_pct)
            }
        }
    }
}

/// 조건과 결과를 묶은 단일 규칙.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// 조건
    pub kind: RuleKind,
    /// 일치 시 시그널
    pub signal: Signal,
    /// 일치 시 심각도
    pub severity: Severity,
    /// 영향 종목을 가져올 섹터 그룹 (없으면 이벤트 대상 자신, 섹터 대상이면 구성 종목)
    pub affected_group: Option<String>,
}

impl Rule {
    pub fn new(kind: RuleKind, signal: Signal, severity: Severity) -> Self {
        Self {
            kind,
            signal,
            severity,
            affected_group: None,
        }
    }

    /// 영향 종목을 섹터 구성 종목으로 확산합니다.
    pub fn fan_out_to(mut self, group: impl Into<String>) -> Self {
        self.affected_group = Some(group.into());
        self
    }
}

/// 본문에서 리콜로 인식하는 표현.
const RECALL_TERMS: [&str; 2] = ["recall", "리콜"];

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn sector_is(event: &NormalizedEvent, sector: &str) -> bool {
    event
        .effective_sector()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case(sector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recall_matches_description_or_type() {
        let by_type = NormalizedEvent::new("TSLA", "PRODUCT_RECALL");
        let by_text = NormalizedEvent::new("TSLA", EventType::PressRelease)
            .with_description("Voluntary RECALL of model Y seats", 500);
        let neither = NormalizedEvent::new("TSLA", EventType::PressRelease);

        assert!(RuleKind::Recall.matches(&by_type));
        assert!(RuleKind::Recall.matches(&by_text));
        assert!(!RuleKind::Recall.matches(&neither));
    }

    #[test]
    fn test_recall_matches_korean_description() {
        let korean = NormalizedEvent::new("005380", EventType::PressRelease)
            .with_description("에어백 결함으로 자발적 리콜 실시", 500);
        let korean_type = NormalizedEvent::new("005380", "리콜");

        assert!(RuleKind::Recall.matches(&korean));
        assert!(!RuleKind::Recall.matches(&korean_type));
    }

    #[test]
    fn test_ceo_rule_reads_event_type_only() {
        let resign = NormalizedEvent::new("UBER", "CEO_RESIGNATION");
        let in_text = NormalizedEvent::new("UBER", EventType::PressRelease)
            .with_description("CEO resignation announced", 500);

        assert!(RuleKind::CeoResignation.matches(&resign));
        assert!(!RuleKind::CeoResignation.matches(&in_text));
    }

    #[test]
    fn test_merger_rule() {
        let text = NormalizedEvent::new("ADBE", EventType::PressRelease)
            .with_description("Adobe completes Acquisition of Figma", 500);
        assert!(RuleKind::MergerAcquisition.matches(&text));
        assert!(RuleKind::MergerAcquisition.matches(&NormalizedEvent::new("ADBE", "M&A")));
    }

    #[test]
    fn test_missing_numeric_fields_never_match() {
        let insider = NormalizedEvent::new("NVDA", EventType::InsiderBuying);
        let sector = NormalizedEvent::new("Semiconductor", EventType::SectorPerformance);

        assert!(!RuleKind::InsiderBuyAbove { min_shares: 100_000 }.matches(&insider));
        assert!(!RuleKind::SectorRiseAbove {
            sector: "SEMICONDUCTOR".into(),
            threshold_pct: 3.0
        }
        .matches(&sector));
    }

    #[test]
    fn test_nan_change_does_not_match() {
        let event = NormalizedEvent::new("Technology", EventType::SectorPerformance)
            .with_change_pct(f64::NAN);
        let rule = RuleKind::SectorFallBelow {
            sector: "Technology".into(),
            threshold_pct: -3.0,
        };
        assert!(!rule.matches(&event));
    }
}
