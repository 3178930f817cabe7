//! 수집 실행 요약.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use signal_core::{Severity, SourceKind};

/// 한 번의 수집 실행 통계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// 실행 ID
    pub run_id: Uuid,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
    /// 종료 시각
    pub finished_at: Option<DateTime<Utc>>,
    /// 추적 대상 수
    pub entities: usize,
    /// 실제로 실행된 어댑터 호출 수
    pub calls: usize,
    /// 소스별 수집 이벤트 수
    pub events_by_source: BTreeMap<SourceKind, usize>,
    /// 실패한 호출 (빈 결과로 처리)
    pub failed_calls: usize,
    /// 성공했지만 이벤트가 없는 호출
    pub empty_calls: usize,
    /// 취소로 실행되지 않은 호출
    pub skipped_calls: usize,
    /// 자격증명이 없어 건너뛴 호출
    pub unconfigured_calls: usize,
    /// 분류되지 않은 이벤트 수
    pub unclassified_events: usize,
    /// 발견된 시그널 수
    pub signals_found: usize,
    /// 심각도별 시그널 수
    pub signals_by_severity: BTreeMap<Severity, usize>,
    /// 저장 성공
    pub saved: usize,
    /// 저장 실패
    pub save_failed: usize,
    /// 취소되었는지 여부
    pub cancelled: bool,
    /// 소요 시간
    pub elapsed: Duration,
}

impl RunSummary {
    /// 새 실행 요약을 시작합니다.
    pub fn start(entities: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            entities,
            calls: 0,
            events_by_source: BTreeMap::new(),
            failed_calls: 0,
            empty_calls: 0,
            skipped_calls: 0,
            unconfigured_calls: 0,
            unclassified_events: 0,
            signals_found: 0,
            signals_by_severity: BTreeMap::new(),
            saved: 0,
            save_failed: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn record_events(&mut self, source: SourceKind, count: usize) {
        *self.events_by_source.entry(source).or_insert(0) += count;
    }

    pub fn record_signal(&mut self, severity: Severity) {
        self.signals_found += 1;
        *self.signals_by_severity.entry(severity).or_insert(0) += 1;
    }

    /// 수집된 전체 이벤트 수
    pub fn total_events(&self) -> usize {
        self.events_by_source.values().sum()
    }

    /// 소스별 이벤트 수 (수집이 없으면 0)
    pub fn events_for(&self, source: SourceKind) -> usize {
        self.events_by_source.get(&source).copied().unwrap_or(0)
    }

    /// 심각도별 시그널 수 (없으면 0)
    pub fn signals_with(&self, severity: Severity) -> usize {
        self.signals_by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// 종료 시각과 소요 시간을 기록합니다.
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.elapsed = (now - self.started_at).to_std().unwrap_or_default();
    }

    /// 호출 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            ((self.calls - self.failed_calls) as f64 / self.calls as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let by_source = self
            .events_by_source
            .iter()
            .map(|(source, count)| format!("{}={}", source, count))
            .collect::<Vec<_>>()
            .join(", ");
        let by_severity = self
            .signals_by_severity
            .iter()
            .map(|(severity, count)| format!("{}={}", severity, count))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!(
            run_id = %self.run_id,
            entities = self.entities,
            calls = self.calls,
            events = self.total_events(),
            events_by_source = %by_source,
            failed = self.failed_calls,
            empty = self.empty_calls,
            skipped = self.skipped_calls,
            unconfigured = self.unconfigured_calls,
            signals = self.signals_found,
            signals_by_severity = %by_severity,
            saved = self.saved,
            save_failed = self.save_failed,
            cancelled = self.cancelled,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}
