//! 규칙 기반 시그널 분류기.
//!
//! 정규화된 이벤트를 `(시그널, 심각도)` 쌍으로 매핑합니다.
//! 규칙은 누적되지 않으며 첫 번째 일치 규칙만 적용됩니다.
//!
//! | 순서 | 조건 | 시그널 | 심각도 |
//! |---|---|---|---|
//! | 1 | "recall" (본문/유형) | IMMEDIATE_SELL | CRITICAL |
//! | 2 | 유형에 CEO + resign | SHORT_TERM_DOWN | HIGH |
//! | 3 | "m&a"/"acquisition" (본문/유형) | MA_ANNOUNCEMENT | HIGH |
//! | 4 | INSIDER_BUYING, 주식 수 > 100,000 | INSIDER_STRONG_BUY | HIGH |
//! | 5 | SEMICONDUCTOR, 변동률 > 3% | SEMICONDUCTOR_RALLY | HIGH |
//! | 6 | Energy, 변동률 > 5% | ENERGY_SECTOR_SURGE | HIGH |
//! | 7 | Technology, 변동률 < -3% | TECH_SELLOFF | HIGH |
//!
//! 분류기는 순수 함수이며 어떤 입력에도 패닉하거나 에러를 반환하지 않습니다.

mod rules;

pub use rules::{Rule, RuleKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{ClassifiedSignal, NormalizedEvent, Severity, Signal};
use crate::universe::SectorConstituents;

/// 정책 임계값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// 내부자 대량 매수 기준 주식 수
    pub insider_strong_buy_shares: i64,
    /// 반도체 랠리 기준 변동률 (%)
    pub semiconductor_rally_pct: f64,
    /// 에너지 급등 기준 변동률 (%)
    pub energy_surge_pct: f64,
    /// 기술주 매도세 기준 변동률 (%, 음수)
    pub tech_selloff_pct: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            insider_strong_buy_shares: 100_000,
            semiconductor_rally_pct: 3.0,
            energy_surge_pct: 5.0,
            tech_selloff_pct: -3.0,
        }
    }
}

impl ClassifierThresholds {
    /// 임계값으로 우선순위 규칙 테이블을 생성합니다.
    pub fn rule_table(&self) -> Vec<Rule> {
        vec![
            Rule::new(RuleKind::Recall, Signal::ImmediateSell, Severity::Critical),
            Rule::new(RuleKind::CeoResignation, Signal::ShortTermDown, Severity::High),
            Rule::new(
                RuleKind::MergerAcquisition,
                Signal::MaAnnouncement,
                Severity::High,
            ),
            Rule::new(
                RuleKind::InsiderBuyAbove {
                    min_shares: self.insider_strong_buy_shares,
                },
                Signal::InsiderStrongBuy,
                Severity::High,
            ),
            Rule::new(
                RuleKind::SectorRiseAbove {
                    sector: "SEMICONDUCTOR".to_string(),
                    threshold_pct: self.semiconductor_rally_pct,
                },
                Signal::SemiconductorRally,
                Severity::High,
            )
            .fan_out_to("SEMICONDUCTOR"),
            Rule::new(
                RuleKind::SectorRiseAbove {
                    sector: "Energy".to_string(),
                    threshold_pct: self.energy_surge_pct,
                },
                Signal::EnergySectorSurge,
                Severity::High,
            )
            .fan_out_to("ENERGY"),
            Rule::new(
                RuleKind::SectorFallBelow {
                    sector: "Technology".to_string(),
                    threshold_pct: self.tech_selloff_pct,
                },
                Signal::TechSelloff,
                Severity::High,
            )
            .fan_out_to("AI"),
        ]
    }
}

/// 시그널 분류기.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    sectors: Arc<SectorConstituents>,
}

impl Classifier {
    /// 임계값과 섹터 구성 종목 테이블로 분류기를 생성합니다.
    pub fn new(thresholds: &ClassifierThresholds, sectors: Arc<SectorConstituents>) -> Self {
        Self {
            rules: thresholds.rule_table(),
            sectors,
        }
    }

    /// 평가 순서대로 정렬된 규칙 테이블.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 이벤트에 처음 일치하는 규칙.
    pub fn first_match(&self, event: &NormalizedEvent) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.kind.matches(event))
    }

    /// 이벤트를 평가합니다. 일치하는 규칙이 없으면 `Unclassified`.
    pub fn evaluate(&self, event: &NormalizedEvent) -> ClassifiedSignal {
        let Some(rule) = self.first_match(event) else {
            return ClassifiedSignal::unclassified(event);
        };

        let signal = ClassifiedSignal::from_event(event, rule.signal, rule.severity);
        match &rule.affected_group {
            Some(group) => match self.sectors.get(group) {
                Some(symbols) => signal.with_affected(symbols.iter().cloned()),
                None => signal,
            },
            None => match self.sector_members(event) {
                Some(symbols) => signal.with_affected(symbols.iter().cloned()),
                None => signal.with_affected([event.entity.clone()]),
            },
        }
    }

    /// 섹터 단위 이벤트(대상 자체가 섹터)의 구성 종목.
    fn sector_members(&self, event: &NormalizedEvent) -> Option<&BTreeSet<String>> {
        event
            .effective_sector()
            .filter(|sector| sector.eq_ignore_ascii_case(event.entity.trim()))
            .and_then(|sector| self.sectors.get(sector))
    }

    /// 이벤트를 분류합니다. 시그널이 없으면 `None`.
    pub fn classify(&self, event: &NormalizedEvent) -> Option<ClassifiedSignal> {
        Some(self.evaluate(event)).filter(ClassifiedSignal::is_actionable)
    }
}
