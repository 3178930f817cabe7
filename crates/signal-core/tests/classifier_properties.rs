//! 분류기 속성 테스트
//!
//! 임의의 이벤트(선택 필드 누락 포함)에 대해 분류기가 패닉하지 않고,
//! 동일 입력에 동일 결과를 내며, 규칙 순서를 지키는지 확인합니다.

use proptest::option;
use proptest::prelude::*;
use std::sync::Arc;

use signal_core::{
    Classifier, ClassifierThresholds, EventType, NormalizedEvent, Severity, Signal, Universe,
};

fn classifier() -> Classifier {
    Classifier::new(
        &ClassifierThresholds::default(),
        Arc::new(Universe::default().sector_constituents),
    )
}

fn event_type_strategy() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::Filing),
        Just(EventType::InsiderBuying),
        Just(EventType::InsiderSelling),
        Just(EventType::PressRelease),
        Just(EventType::SectorPerformance),
        Just(EventType::PolicyNews),
        "[A-Za-z_&]{0,24}".prop_map(|s| EventType::parse(&s)),
    ]
}

fn event_strategy() -> impl Strategy<Value = NormalizedEvent> {
    (
        "[A-Za-z]{1,12}",
        event_type_strategy(),
        option::of(".{0,80}"),
        option::of(any::<i64>()),
        option::of(any::<f64>()),
        option::of(prop_oneof![
            Just("SEMICONDUCTOR".to_string()),
            Just("energy".to_string()),
            Just("Technology".to_string()),
            "[A-Za-z]{0,10}",
        ]),
    )
        .prop_map(|(entity, event_type, description, shares, change_pct, sector)| {
            let mut event = NormalizedEvent::new(entity, event_type);
            if let Some(text) = description {
                event = event.with_description(text, 500);
            }
            event.magnitude.shares = shares;
            event.magnitude.change_pct = change_pct;
            event.sector = sector;
            event
        })
}

proptest! {
    #[test]
    fn classify_never_panics_and_is_idempotent(event in event_strategy()) {
        let classifier = classifier();
        let first = classifier.classify(&event);
        let second = classifier.classify(&event);

        prop_assert_eq!(&first, &second);
        if let Some(signal) = first {
            prop_assert!(signal.signal != Signal::Unclassified);
            prop_assert_eq!(signal.entity, event.entity);
        }
    }

    #[test]
    fn recall_in_description_always_wins(event in event_strategy(), prefix in "[a-z ]{0,10}") {
        let event = event.with_description(format!("{prefix} recall notice"), 500);
        let signal = classifier().classify(&event).unwrap();

        prop_assert_eq!(signal.signal, Signal::ImmediateSell);
        prop_assert_eq!(signal.severity, Severity::Critical);
    }

    #[test]
    fn result_comes_from_first_matching_rule(event in event_strategy()) {
        let classifier = classifier();
        let expected = classifier
            .rules()
            .iter()
            .find(|rule| rule.kind.matches(&event))
            .map(|rule| (rule.signal, rule.severity));

        let actual = classifier.classify(&event).map(|s| (s.signal, s.severity));
        prop_assert_eq!(actual, expected);
    }
}
