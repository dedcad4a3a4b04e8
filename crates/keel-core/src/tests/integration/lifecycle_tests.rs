#![cfg(test)]

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::composite::container::CompositeContainer;
use crate::composite::error::{LifecyclePhase, StartupError};
use crate::composite::state::CompositeState;
use crate::module::descriptor::ModuleState;
use crate::module::service::{InterfaceRef, ServiceDependency};

use super::common::{new_tracker, plugin, recorded, FailPhase, TrackedModule};

const PIPE: InterfaceRef = InterfaceRef::named("pipe");

#[tokio::test]
async fn test_full_lifecycle() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "upstream",
            vec![Box::new(
                TrackedModule::new("source", tracker.clone()).exposing(PIPE),
            )],
        ))
        .unwrap();
    container
        .register_plugin(plugin(
            "downstream",
            vec![Box::new(
                TrackedModule::new("sink", tracker.clone())
                    .consuming(ServiceDependency::required(PIPE)),
            )],
        ))
        .unwrap();

    container.compose().unwrap();
    let cancel = CancellationToken::new();
    container.start(&cancel).await.unwrap();

    assert_eq!(container.state(), CompositeState::Running);
    assert_eq!(
        container.module_state("upstream", "source"),
        Some(ModuleState::Running)
    );

    let warnings = container.stop().await;
    assert!(warnings.is_empty());
    assert_eq!(container.state(), CompositeState::Stopped);
    assert_eq!(
        container.module_state("downstream", "sink"),
        Some(ModuleState::Stopped)
    );

    let order = recorded(&tracker);
    assert_eq!(
        order,
        vec![
            "configure:source",
            "configure:sink",
            "register:source",
            "register:sink",
            "start:source",
            "start:sink",
            "resolved:source",
            "run:source",
            "run:sink",
            // Reverse dependency order on the way down
            "stop:sink",
            "stop:source",
        ]
    );

    container.dispose();
    assert_eq!(container.state(), CompositeState::Disposed);
}

#[tokio::test]
async fn test_start_failure_triggers_reverse_teardown() {
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
                        .failing_in(FailPhase::Start),
                ),
            ],
        ))
        .unwrap();

    container.compose().unwrap();
    let cancel = CancellationToken::new();
    let result = container.start(&cancel).await;

    match result {
        Err(StartupError::ModuleFailed { phase, module, .. }) => {
            assert_eq!(phase, LifecyclePhase::Start);
            assert_eq!(module, "p::b");
        }
        other => panic!("Expected ModuleFailed, got {:?}", other),
    }
    assert_eq!(container.state(), CompositeState::Stopped);

    let order = recorded(&tracker);
    // Only the module that did start gets stopped
    assert!(order.contains(&"stop:a".to_string()));
    assert!(!order.contains(&"stop:b".to_string()));
    assert!(!order.contains(&"run:a".to_string()));
}

#[tokio::test]
async fn test_run_failure_tears_down_all_started() {
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
                        .failing_in(FailPhase::Run),
                ),
            ],
        ))
        .unwrap();

    container.compose().unwrap();
    let cancel = CancellationToken::new();
    let result = container.start(&cancel).await;

    match result {
        Err(StartupError::ModuleFailed { phase, module, .. }) => {
            assert_eq!(phase, LifecyclePhase::Run);
            assert_eq!(module, "p::b");
        }
        other => panic!("Expected ModuleFailed, got {:?}", other),
    }

    let order = recorded(&tracker);
    let pos = |entry: &str| order.iter().position(|o| o == entry);
    // Both modules started, so both are stopped, in reverse start order
    assert!(pos("stop:b").unwrap() < pos("stop:a").unwrap());
}

#[tokio::test]
async fn test_cancellation_routes_through_teardown() {
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
                        .slow_start(Duration::from_secs(60)),
                ),
            ],
        ))
        .unwrap();

    container.compose().unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = container.start(&cancel).await;
    match result {
        Err(StartupError::Cancelled { module }) => assert_eq!(module, "p::b"),
        other => panic!("Expected Cancelled, got {:?}", other),
    }
    assert_eq!(container.state(), CompositeState::Stopped);

    let order = recorded(&tracker);
    // The started module was torn down; the cancelled one never completed
    assert!(order.contains(&"stop:a".to_string()));
    assert!(!order.contains(&"start:b".to_string()));
}

#[tokio::test]
async fn test_start_with_timeout_cancels_slow_startup() {
    let tracker = new_tracker();
    let mut container = CompositeContainer::new();
    container
        .register_plugin(plugin(
            "p",
            vec![Box::new(
                TrackedModule::new("slow", tracker.clone())
                    .slow_start(Duration::from_secs(60)),
            )],
        ))
        .unwrap();

    container.compose().unwrap();
    let cancel = CancellationToken::new();
    let result = container
        .start_with_timeout(&cancel, Duration::from_millis(50))
        .await;

    assert!(matches!(result, Err(StartupError::Cancelled { .. })));
    // The caller's own token is untouched by the internal deadline
    assert!(!cancel.is_cancelled());
}
