//! 오케스트레이터 통합 테스트.
//!
//! 네트워크 없이 테스트용 어댑터와 저장소로 수집 → 분류 → 저장 흐름을 검증합니다.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use signal_collector::Orchestrator;
use signal_core::{
    ClassifiedSignal, Classifier, ClassifierThresholds, EntityKind, EventType, NormalizedEvent,
    Severity, Signal, SourceKind, TrackedEntity, Universe,
};
use signal_data::{
    AdapterSettings, ClientSettings, FmpApi, FmpInsiderTradeAdapter, ProviderAdapter,
    ProviderError, SignalSink,
};

type EventFn = fn(&TrackedEntity) -> Vec<NormalizedEvent>;

/// 대상별로 고정 이벤트를 돌려주는 어댑터.
struct StaticAdapter {
    name: &'static str,
    source: SourceKind,
    kind: EntityKind,
    events: EventFn,
    calls: AtomicUsize,
    cancel_on_call: Option<CancellationToken>,
}

impl StaticAdapter {
    fn new(name: &'static str, source: SourceKind, kind: EntityKind, events: EventFn) -> Self {
        Self {
            name,
            source,
            kind,
            events,
            calls: AtomicUsize::new(0),
            cancel_on_call: None,
        }
    }
}

#[async_trait]
impl ProviderAdapter for StaticAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn source(&self) -> SourceKind {
        self.source
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == self.kind
    }

    async fn try_fetch(
        &self,
        entity: &TrackedEntity,
    ) -> Result<Vec<NormalizedEvent>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        Ok((self.events)(entity))
    }
}

/// 항상 실패하는 어댑터.
struct FailingAdapter;

#[async_trait]
impl ProviderAdapter for FailingAdapter {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn source(&self) -> SourceKind {
        SourceKind::InsiderTrade
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Symbol
    }

    async fn try_fetch(
        &self,
        _entity: &TrackedEntity,
    ) -> Result<Vec<NormalizedEvent>, ProviderError> {
        Err(ProviderError::Status {
            provider: "failing",
            status: 500,
            body: "upstream down".into(),
        })
    }
}

/// 자격증명이 없는 어댑터.
struct UnconfiguredAdapter {
    calls: AtomicUsize,
}

#[async_trait]
impl ProviderAdapter for UnconfiguredAdapter {
    fn name(&self) -> &'static str {
        "no_key"
    }

    fn source(&self) -> SourceKind {
        SourceKind::PolicyNews
    }

    fn accepts(&self, entity: &TrackedEntity) -> bool {
        entity.kind() == EntityKind::Sector
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn try_fetch(
        &self,
        _entity: &TrackedEntity,
    ) -> Result<Vec<NormalizedEvent>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// 기록한 시그널을 보관하고 특정 대상에서 실패하는 저장소.
#[derive(Default)]
struct RecordingSink {
    stored: Mutex<Vec<ClassifiedSignal>>,
    fail_for: Option<&'static str>,
}

#[async_trait]
impl SignalSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn insert_signal(&self, signal: &ClassifiedSignal) -> Result<(), ProviderError> {
        if self.fail_for == Some(signal.entity.as_str()) {
            return Err(ProviderError::Storage("constraint violation".into()));
        }
        self.stored.lock().unwrap().push(signal.clone());
        Ok(())
    }
}

fn classifier() -> Arc<Classifier> {
    let universe = Universe::default();
    Arc::new(Classifier::new(
        &ClassifierThresholds::default(),
        Arc::new(universe.sector_constituents.clone()),
    ))
}

fn press_events(entity: &TrackedEntity) -> Vec<NormalizedEvent> {
    let body = match entity.id() {
        "AAPL" => "Voluntary recall of charging cables",
        _ => "Quarterly business update",
    };
    vec![NormalizedEvent::new(entity.id(), EventType::PressRelease).with_description(body, 500)]
}

fn sector_events(entity: &TrackedEntity) -> Vec<NormalizedEvent> {
    match entity.id() {
        "Semiconductor" => vec![NormalizedEvent::new(entity.id(), EventType::SectorPerformance)
            .with_sector(entity.id())
            .with_change_pct(4.0)],
        _ => Vec::new(),
    }
}

fn entities() -> Vec<TrackedEntity> {
    vec![
        TrackedEntity::symbol("AAPL"),
        TrackedEntity::symbol("NVDA"),
        TrackedEntity::sector("Semiconductor"),
        TrackedEntity::sector("Energy"),
    ]
}

#[tokio::test]
async fn test_partial_failures_are_counted_not_fatal() {
    let unconfigured = Arc::new(UnconfiguredAdapter {
        calls: AtomicUsize::new(0),
    });
    let sink = Arc::new(RecordingSink {
        fail_for: Some("AAPL"),
        ..Default::default()
    });

    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(StaticAdapter::new(
            "press",
            SourceKind::PressRelease,
            EntityKind::Symbol,
            press_events,
        )),
        Arc::new(FailingAdapter),
        Arc::new(StaticAdapter::new(
            "sector",
            SourceKind::SectorPerformance,
            EntityKind::Sector,
            sector_events,
        )),
        unconfigured.clone(),
    ];
    let orchestrator = Orchestrator::new(adapters, classifier(), sink.clone(), 3);

    let summary = orchestrator.run(&entities()).await;

    assert_eq!(summary.entities, 4);
    assert_eq!(summary.calls, 6);
    assert_eq!(summary.failed_calls, 2);
    assert_eq!(summary.empty_calls, 1);
    assert_eq!(summary.unconfigured_calls, 2);
    assert_eq!(summary.skipped_calls, 0);
    assert_eq!(unconfigured.calls.load(Ordering::SeqCst), 0);

    assert_eq!(summary.events_for(SourceKind::PressRelease), 2);
    assert_eq!(summary.events_for(SourceKind::SectorPerformance), 1);
    assert_eq!(summary.events_for(SourceKind::InsiderTrade), 0);
    assert_eq!(summary.total_events(), 3);

    assert_eq!(summary.signals_found, 2);
    assert_eq!(summary.unclassified_events, 1);
    assert_eq!(summary.signals_with(Severity::Critical), 1);
    assert_eq!(summary.signals_with(Severity::High), 1);

    // AAPL 리콜 시그널은 저장 실패, 반도체 랠리는 저장 성공
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.save_failed, 1);
    assert!(!summary.cancelled);
    assert!(summary.finished_at.is_some());

    let stored = sink.stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].signal, Signal::SemiconductorRally);
    assert_eq!(
        stored[0].affected_entities.iter().map(String::as_str).collect::<Vec<_>>(),
        ["AMD", "INTC", "NVDA", "TSM"]
    );
}

#[tokio::test]
async fn test_cancelled_before_run_issues_no_calls() {
    let press = Arc::new(StaticAdapter::new(
        "press",
        SourceKind::PressRelease,
        EntityKind::Symbol,
        press_events,
    ));
    let sink = Arc::new(RecordingSink::default());
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![press.clone()];
    let orchestrator = Orchestrator::new(adapters, classifier(), sink.clone(), 2);

    orchestrator.cancellation_token().cancel();
    let summary = orchestrator.run(&entities()).await;

    assert!(summary.cancelled);
    assert_eq!(summary.calls, 0);
    assert_eq!(summary.skipped_calls, 2);
    assert_eq!(press.calls.load(Ordering::SeqCst), 0);
    assert!(sink.stored.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_in_flight_results_survive_cancellation() {
    let token = CancellationToken::new();
    let mut press = StaticAdapter::new(
        "press",
        SourceKind::PressRelease,
        EntityKind::Symbol,
        |entity| {
            vec![NormalizedEvent::new(entity.id(), EventType::parse("PRODUCT_RECALL"))]
        },
    );
    press.cancel_on_call = Some(token.clone());
    let press = Arc::new(press);
    let sink = Arc::new(RecordingSink::default());

    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![press.clone()];
    let orchestrator = Orchestrator::new(adapters, classifier(), sink.clone(), 1)
        .with_cancellation_token(token);

    let entities = vec![
        TrackedEntity::symbol("AAPL"),
        TrackedEntity::symbol("MSFT"),
        TrackedEntity::symbol("TSLA"),
    ];
    let summary = orchestrator.run(&entities).await;

    assert!(summary.cancelled);
    assert_eq!(press.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.calls, 1);
    assert_eq!(summary.skipped_calls, 2);

    // 취소 전에 시작된 호출의 이벤트는 분류/저장됨
    let stored = sink.stored.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].signal, Signal::ImmediateSell);
    assert_eq!(summary.saved, 1);
}

#[tokio::test]
async fn test_no_applicable_adapters() {
    let orchestrator = Orchestrator::new(
        vec![Arc::new(FailingAdapter) as Arc<dyn ProviderAdapter>],
        classifier(),
        Arc::new(RecordingSink::default()),
        4,
    );

    let summary = orchestrator
        .run(&[TrackedEntity::commodity("WTI")])
        .await;

    assert_eq!(summary.calls, 0);
    assert_eq!(summary.failed_calls, 0);
    assert_eq!(summary.total_events(), 0);
    assert_eq!(summary.signals_found, 0);
}

#[tokio::test]
async fn test_request_budget_resets_between_runs() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", mockito::Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .expect(4)
        .create_async()
        .await;

    // 실행당 2건: 종목 2개면 한 실행에 예산을 모두 사용
    let api = FmpApi::new(
        server.url(),
        Some(secrecy::SecretString::new("demo".into())),
        &ClientSettings {
            request_budget: 2,
            ..ClientSettings::default()
        },
    )
    .unwrap();
    let insider = Arc::new(FmpInsiderTradeAdapter::new(api, AdapterSettings::default()));
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![insider.clone()];
    let orchestrator = Orchestrator::new(
        adapters,
        classifier(),
        Arc::new(RecordingSink::default()),
        2,
    );
    let entities = [TrackedEntity::symbol("AAPL"), TrackedEntity::symbol("MSFT")];

    let first = orchestrator.run(&entities).await;
    assert_eq!(first.failed_calls, 0);
    assert_eq!(first.empty_calls, 2);
    assert_eq!(insider.remaining_budget(), Some(0));

    let second = orchestrator.run(&entities).await;
    assert_eq!(second.calls, 2);
    assert_eq!(second.failed_calls, 0);
    assert_eq!(second.empty_calls, 2);

    mock.assert_async().await;
}
