#![cfg(test)]

use tokio_util::sync::CancellationToken;

use crate::composite::container::CompositeContainer;
use crate::composite::error::CompositionError;
use crate::module::service::{InterfaceRef, ServiceDependency};
use crate::resolver::error::ResolutionError;

use super::common::{new_tracker, plugin, recorded, ProvidedService, TrackedModule};

const IA: InterfaceRef = InterfaceRef::named("ia");
const IB: InterfaceRef = InterfaceRef::named("ib");
const ICALC: InterfaceRef = InterfaceRef::named("icalc");

#[test]
fn test_register_services_order_follows_dependencies() {
    // Registration order A, C, B; C consumes B's interface, B consumes
    // A's. The observed register_services order must be exactly A, B, C.
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "pa",
            vec![Box::new(TrackedModule::new("a", tracker.clone()).exposing(IA))],
        ))
        .unwrap();
    container
        .register_plugin(plugin(
            "pc",
            vec![Box::new(
                TrackedModule::new("c", tracker.clone())
                    .consuming(ServiceDependency::required(IB)),
            )],
        ))
        .unwrap();
    container
        .register_plugin(plugin(
            "pb",
            vec![Box::new(
                TrackedModule::new("b", tracker.clone())
                    .exposing(IB)
                    .consuming(ServiceDependency::required(IA)),
            )],
        ))
        .unwrap();

    container.compose().unwrap();

    let register_order: Vec<String> = recorded(&tracker)
        .into_iter()
        .filter(|entry| entry.starts_with("register:"))
        .collect();
    assert_eq!(register_order, vec!["register:a", "register:b", "register:c"]);
}

#[tokio::test]
async fn test_required_dependency_scenario() {
    // P1 exposes icalc, P2's module requires it: composition succeeds and
    // P2 registers after P1.
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p2",
            vec![Box::new(
                TrackedModule::new("consumer", tracker.clone())
                    .consuming(ServiceDependency::required(ICALC)),
            )],
        ))
        .unwrap();
    container
        .register_plugin(plugin(
            "p1",
            vec![Box::new(
                TrackedModule::new("provider", tracker.clone()).exposing(ICALC),
            )],
        ))
        .unwrap();

    let services = container.compose().unwrap();
    assert_eq!(
        container.resolved_order(),
        vec!["p1::provider", "p2::consumer"]
    );
    assert_eq!(
        services
            .resolve::<ProvidedService>(&ICALC)
            .unwrap()
            .provider,
        "provider"
    );
}

#[test]
fn test_missing_required_dependency_fails_composition() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p2",
            vec![Box::new(
                TrackedModule::new("consumer", tracker)
                    .consuming(ServiceDependency::required(ICALC)),
            )],
        ))
        .unwrap();

    let result = container.compose();
    match result {
        Err(CompositionError::Resolution(ResolutionError::MissingProvider {
            consumer,
            interface,
        })) => {
            assert_eq!(consumer, "p2::consumer");
            assert_eq!(interface, ICALC);
        }
        other => panic!("Expected MissingProvider, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_optional_dependency_observes_no_provider() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p2",
            vec![Box::new(
                TrackedModule::new("consumer", tracker.clone())
                    .consuming(ServiceDependency::optional(ICALC)),
            )],
        ))
        .unwrap();

    let services = container.compose().unwrap();
    assert!(services.resolve::<ProvidedService>(&ICALC).is_none());

    let cancel = CancellationToken::new();
    container.start(&cancel).await.unwrap();

    // The consumer started and observed "no provider" at runtime
    let order = recorded(&tracker);
    assert!(order.contains(&"start:consumer".to_string()));
    assert!(order.contains(&"absent:icalc".to_string()));
}

#[test]
fn test_cycle_across_plugins_fails_composition() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p1",
            vec![Box::new(
                TrackedModule::new("a", tracker.clone())
                    .exposing(IA)
                    .consuming(ServiceDependency::required(IB)),
            )],
        ))
        .unwrap();
    container
        .register_plugin(plugin(
            "p2",
            vec![Box::new(
                TrackedModule::new("b", tracker)
                    .exposing(IB)
                    .consuming(ServiceDependency::required(IA)),
            )],
        ))
        .unwrap();

    let result = container.compose();
    match result {
        Err(CompositionError::Resolution(ResolutionError::CyclicDependency(path))) => {
            assert!(path.contains(&"p1::a".to_string()));
            assert!(path.contains(&"p2::b".to_string()));
        }
        other => panic!("Expected CyclicDependency, got {:?}", other.err()),
    }
}
