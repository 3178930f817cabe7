//! 수집 오케스트레이터.
//!
//! 한 번의 실행은 다음 순서로 진행됩니다:
//! 1. 적용 가능한 (대상, 어댑터) 쌍을 `buffer_unordered`로 병렬 조회
//! 2. 수집된 이벤트를 분류
//! 3. 시그널을 저장소에 하나씩 기록
//!
//! 요청 예산은 실행마다 새로 시작합니다 (`ProviderAdapter::reset_budget`).
//!
//! 어댑터 실패와 레코드 단위 저장 실패는 실행을 중단하지 않고
//! `RunSummary`에만 집계됩니다. 취소 토큰이 취소되면 새 호출은 시작하지
//! 않으며, 이미 진행 중인 호출의 결과는 그대로 분류/저장합니다.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use signal_core::{collect_span, Classifier, NormalizedEvent, SourceKind, TrackedEntity, Universe};
use signal_data::{
    AlphaVantageCommodityAdapter, FetchOutcome, FmpApi, FmpInsiderTradeAdapter,
    FmpPressReleaseAdapter, PolicyNewsAdapter, ProviderAdapter, SecFilingsAdapter,
    SectorEtfAdapter, SignalSink, YahooQuoteSource,
};

use crate::config::{copy_secret, CollectorConfig};
use crate::stats::RunSummary;
use crate::Result;

/// 어댑터 호출 하나의 결과.
enum CallResult {
    Finished(SourceKind, FetchOutcome),
    Skipped,
}

/// 설정으로부터 전체 어댑터 목록을 생성합니다.
///
/// 자격증명이 없는 어댑터도 목록에 포함되며 `is_configured()`가 `false`를
/// 반환합니다.
pub fn build_adapters(
    config: &CollectorConfig,
    universe: &Arc<Universe>,
) -> Result<Vec<Arc<dyn ProviderAdapter>>> {
    let collect = &config.collect;
    let credentials = &config.credentials;
    let endpoints = &config.endpoints;
    let adapter_settings = collect.adapter_settings();

    let sec = SecFilingsAdapter::new(
        endpoints.sec.as_str(),
        credentials.sec_user_agent.as_str(),
        Arc::new(universe.regulator_ids.clone()),
        &collect.client_settings(config.budgets.sec),
        adapter_settings.clone(),
    )?;

    // 내부자 매매와 보도자료는 같은 FMP 키와 예산을 공유
    let fmp = FmpApi::new(
        endpoints.fmp.as_str(),
        credentials.fmp_api_key.as_ref().map(copy_secret),
        &collect.client_settings(config.budgets.fmp),
    )?;

    let commodities = AlphaVantageCommodityAdapter::new(
        endpoints.alpha_vantage.as_str(),
        credentials.alpha_vantage_api_key.as_ref().map(copy_secret),
        &collect.client_settings(config.budgets.alpha_vantage),
    )?;

    let quotes = YahooQuoteSource::new(&collect.client_settings(config.budgets.yahoo))?;
    let sector_etfs = SectorEtfAdapter::new(
        Arc::new(quotes),
        Arc::new(universe.sector_etfs.clone()),
    );

    let policy_news = PolicyNewsAdapter::new(
        endpoints.news_api.as_str(),
        credentials.news_api_key.as_ref().map(copy_secret),
        Arc::clone(universe),
        &collect.client_settings(config.budgets.news_api),
        adapter_settings.clone(),
    )?;

    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(sec),
        Arc::new(FmpInsiderTradeAdapter::new(fmp.clone(), adapter_settings.clone())),
        Arc::new(FmpPressReleaseAdapter::new(fmp, adapter_settings)),
        Arc::new(commodities),
        Arc::new(sector_etfs),
        Arc::new(policy_news),
    ];
    Ok(adapters)
}

/// 수집 → 분류 → 저장 파이프라인.
pub struct Orchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    classifier: Arc<Classifier>,
    sink: Arc<dyn SignalSink>,
    concurrency: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        classifier: Arc<Classifier>,
        sink: Arc<dyn SignalSink>,
        concurrency: usize,
    ) -> Self {
        Self {
            adapters,
            classifier,
            sink,
            concurrency: concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// 설정과 유니버스로 오케스트레이터를 구성합니다.
    pub fn from_config(
        config: &CollectorConfig,
        universe: Arc<Universe>,
        sink: Arc<dyn SignalSink>,
    ) -> Result<Self> {
        let adapters = build_adapters(config, &universe)?;
        let classifier = Classifier::new(
            &config.thresholds,
            Arc::new(universe.sector_constituents.clone()),
        );

        Ok(Self::new(
            adapters,
            Arc::new(classifier),
            sink,
            config.collect.concurrency,
        ))
    }

    /// 외부에서 만든 취소 토큰을 사용합니다.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn adapters(&self) -> &[Arc<dyn ProviderAdapter>] {
        &self.adapters
    }

    /// 실행 취소 토큰. 취소하면 새 어댑터 호출이 시작되지 않습니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 대상 전체에 대해 한 번 수집합니다.
    pub async fn run(&self, entities: &[TrackedEntity]) -> RunSummary {
        let mut summary = RunSummary::start(entities.len());
        info!(
            run_id = %summary.run_id,
            entities = entities.len(),
            adapters = self.adapters.len(),
            concurrency = self.concurrency,
            sink = self.sink.name(),
            "수집 실행 시작"
        );

        // 요청 예산은 실행 단위
        for adapter in &self.adapters {
            adapter.reset_budget();
        }

        let mut pairs = Vec::new();
        let mut unconfigured = BTreeSet::new();
        for entity in entities {
            for adapter in &self.adapters {
                if !adapter.accepts(entity) {
                    continue;
                }
                if adapter.is_configured() {
                    pairs.push((entity.clone(), Arc::clone(adapter)));
                } else {
                    summary.unconfigured_calls += 1;
                    unconfigured.insert(adapter.name());
                }
            }
        }
        for name in &unconfigured {
            warn!(provider = *name, "자격증명 미설정, 이번 실행에서 건너뜀");
        }

        let events = self.collect(pairs, &mut summary).await;
        self.classify_and_store(&events, &mut summary).await;

        summary.cancelled = self.cancel.is_cancelled();
        summary.finish();
        summary.log_summary();
        summary
    }

    async fn collect(
        &self,
        pairs: Vec<(TrackedEntity, Arc<dyn ProviderAdapter>)>,
        summary: &mut RunSummary,
    ) -> Vec<NormalizedEvent> {
        let results: Vec<CallResult> = stream::iter(pairs)
            .map(|(entity, adapter)| {
                let cancel = self.cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return CallResult::Skipped;
                    }
                    let source = adapter.source();
                    let outcome = adapter
                        .fetch_outcome(&entity)
                        .instrument(collect_span!("fetch", entity, source))
                        .await;
                    CallResult::Finished(source, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut events = Vec::new();
        for result in results {
            match result {
                CallResult::Skipped => summary.skipped_calls += 1,
                CallResult::Finished(source, outcome) => {
                    summary.calls += 1;
                    match outcome {
                        FetchOutcome::Collected(collected) => {
                            if collected.is_empty() {
                                summary.empty_calls += 1;
                            }
                            summary.record_events(source, collected.len());
                            events.extend(collected);
                        }
                        FetchOutcome::Failed(_) => summary.failed_calls += 1,
                        FetchOutcome::Unconfigured => summary.unconfigured_calls += 1,
                    }
                }
            }
        }

        if summary.skipped_calls > 0 {
            warn!(skipped = summary.skipped_calls, "취소로 실행되지 않은 호출");
        }
        events
    }

    async fn classify_and_store(&self, events: &[NormalizedEvent], summary: &mut RunSummary) {
        for event in events {
            let Some(signal) = self.classifier.classify(event) else {
                summary.unclassified_events += 1;
                continue;
            };

            summary.record_signal(signal.severity);
            debug!(
                entity = %signal.entity,
                signal = %signal.signal,
                severity = %signal.severity,
                "시그널 발견"
            );

            match self.sink.insert_signal(&signal).await {
                Ok(()) => summary.saved += 1,
                Err(e) => {
                    summary.save_failed += 1;
                    error!(
                        sink = self.sink.name(),
                        entity = %signal.entity,
                        signal = %signal.signal,
                        error = %e,
                        "시그널 저장 실패"
                    );
                }
            }
        }
    }
}
