#![cfg(test)]

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::composite::container::CompositeContainer;
use crate::composite::state::CompositeState;
use crate::module::service::{InterfaceRef, ServiceDependency};

use super::common::{new_tracker, plugin, recorded, FailPhase, TrackedModule};

const PIPE: InterfaceRef = InterfaceRef::named("pipe");

#[tokio::test]
async fn test_stop_is_best_effort() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p",
            vec![
                Box::new(TrackedModule::new("a", tracker.clone()).exposing(PIPE)),
                Box::new(
                    TrackedModule::new("b", tracker.clone())
                        .consuming(ServiceDependency::required(PIPE))
                        .failing_in(FailPhase::Stop),
                ),
            ],
        ))
        .unwrap();

    container.compose().unwrap();
    let cancel = CancellationToken::new();
    container.start(&cancel).await.unwrap();

    let warnings = container.stop().await;

    // B's failure is reported, and A was still stopped afterwards
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].module, "p::b");

    let order = recorded(&tracker);
    let pos = |entry: &str| order.iter().position(|o| o == entry).unwrap();
    assert!(pos("stop:b") < pos("stop:a"));

    // The warning is captured in the composite log under B's scope
    assert_eq!(
        container.log().module_entry("p", "b", "shutdown_warning"),
        Some(&json!("simulated stop failure"))
    );
    assert_eq!(container.state(), CompositeState::Stopped);
}

#[tokio::test]
async fn test_stop_before_start_is_a_noop() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p",
            vec![Box::new(TrackedModule::new("a", tracker.clone()))],
        ))
        .unwrap();
    container.compose().unwrap();

    let warnings = container.stop().await;
    assert!(warnings.is_empty());
    // Still composed, never started
    assert_eq!(container.state(), CompositeState::ServicesRegistered);
    assert!(!recorded(&tracker).contains(&"stop:a".to_string()));
}

#[tokio::test]
async fn test_second_stop_is_empty() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p",
            vec![Box::new(TrackedModule::new("a", tracker.clone()))],
        ))
        .unwrap();
    container.compose().unwrap();
    let cancel = CancellationToken::new();
    container.start(&cancel).await.unwrap();

    assert_eq!(container.stop().await.len(), 0);
    assert_eq!(container.stop().await.len(), 0);

    let stops = recorded(&tracker)
        .iter()
        .filter(|e| e.starts_with("stop:"))
        .count();
    assert_eq!(stops, 1);
}
