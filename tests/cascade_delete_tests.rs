//! Cascading deletion through the flow pipeline in both deletion modes

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{eventually, RecordingDependent, TestHarness, GB};
use resource_orchestrator::cascade::{CascadeAction, DeletionMode};
use resource_orchestrator::error::ErrorKind;
use resource_orchestrator::events::CanonicalEvent;
use resource_orchestrator::messaging::Command;
use resource_orchestrator::state_machine::{ResourceState, StateEvent};

fn deletions(events: &[CanonicalEvent]) -> Vec<&CanonicalEvent> {
    events
        .iter()
        .filter(|e| matches!(e, CanonicalEvent::ResourceDeleted { .. }))
        .collect()
}

#[tokio::test]
async fn test_permissive_delete_with_accepting_dependent() {
    let mut harness = TestHarness::new();
    let id = harness.add_connected(10 * GB, 10 * GB).await;
    let dependent = RecordingDependent::new("image-cache");
    harness.ctx().cascade.register(dependent.clone());

    let reply = harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Permissive,
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.inventory().unwrap().id, id);

    let events = harness.drain_events();
    let deleted = deletions(&events);
    assert_eq!(deleted.len(), 1);
    assert!(matches!(
        deleted[0],
        CanonicalEvent::ResourceDeleted { error: None, inventory: Some(_), .. }
    ));

    assert!(harness.record(id).await.is_none());
    assert!(!harness.ctx().bus.is_registered(id));
    assert!(!harness.ctx().supervisor.is_tracked(id));
    assert_eq!(harness.driver.calls_of("delete"), 1);
    assert!(dependent.saw(CascadeAction::DeletionCheck));
    assert!(dependent.saw(CascadeAction::DeletionDelete));
    assert!(!dependent.saw(CascadeAction::DeletionForceDelete));
    let seen = &dependent;
    assert!(eventually(move || async move { seen.saw(CascadeAction::DeletionCleanup) }).await);

    let err = harness.manager.send(id, Command::Scan).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

    let manager = &harness.manager;
    assert!(eventually(move || async move { manager.reap() == 1 }).await);
    assert_eq!(harness.manager.live_count(), 0);
}

#[tokio::test]
async fn test_permissive_veto_leaves_record_unchanged() {
    let mut harness = TestHarness::new();
    let id = harness.add_connected(10 * GB, 10 * GB).await;
    let blocker = RecordingDependent::refusing("vm-root-volume", CascadeAction::DeletionCheck);
    harness.ctx().cascade.register(blocker.clone());
    let before = harness.record(id).await.unwrap();

    let err = harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Permissive,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VetoedByDependent);
    assert!(err.to_string().contains("vm-root-volume"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.record(id).await.unwrap(), before);
    assert!(!blocker.saw(CascadeAction::DeletionDelete));
    assert!(!blocker.saw(CascadeAction::DeletionCleanup));
    assert_eq!(harness.driver.calls_of("delete"), 0);
    assert!(harness.ctx().bus.is_registered(id));

    let events = harness.drain_events();
    let deleted = deletions(&events);
    assert_eq!(deleted.len(), 1);
    assert!(matches!(
        deleted[0],
        CanonicalEvent::ResourceDeleted { error: Some(_), inventory: None, .. }
    ));
}

#[tokio::test]
async fn test_enforced_delete_skips_check_phase() {
    let harness = TestHarness::new();
    let id = harness.add(10 * GB, 10 * GB).await.inventory.id;
    let blocker = RecordingDependent::refusing("vm-root-volume", CascadeAction::DeletionCheck);
    harness.ctx().cascade.register(blocker.clone());

    harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Enforced,
            },
        )
        .await
        .unwrap();

    assert!(!blocker.saw(CascadeAction::DeletionCheck));
    assert!(!blocker.saw(CascadeAction::DeletionDelete));
    assert!(blocker.saw(CascadeAction::DeletionForceDelete));
    assert!(harness.record(id).await.is_none());
}

#[tokio::test]
async fn test_failed_delete_phase_restores_prior_state() {
    let harness = TestHarness::new();
    let id = harness.add(10 * GB, 10 * GB).await.inventory.id;
    harness
        .manager
        .send(
            id,
            Command::ChangeState {
                event: StateEvent::Disable,
            },
        )
        .await
        .unwrap();
    harness
        .ctx()
        .cascade
        .register(RecordingDependent::refusing("snapshot-tree", CascadeAction::DeletionDelete));
    let before = harness.record(id).await.unwrap();

    let err = harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Permissive,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    let record = harness.record(id).await.unwrap();
    assert_eq!(record.state, ResourceState::Disabled);
    assert_eq!(record, before);
    assert_eq!(harness.driver.calls_of("delete"), 0);
}

#[tokio::test]
async fn test_driver_delete_failure_keeps_resource() {
    let mut harness = TestHarness::new();
    let id = harness.add_connected(10 * GB, 10 * GB).await;
    harness.driver.delete_fails.store(true, Ordering::SeqCst);

    let err = harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Enforced,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendFailure);

    let record = harness.record(id).await.unwrap();
    assert_eq!(record.state, ResourceState::Enabled);
    assert!(harness.ctx().bus.is_registered(id));
    assert!(harness.ctx().supervisor.is_tracked(id));

    // The resource stays usable and a later attempt can succeed
    harness.driver.delete_fails.store(false, Ordering::SeqCst);
    harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Enforced,
            },
        )
        .await
        .unwrap();
    assert!(harness.record(id).await.is_none());

    let events = harness.drain_events();
    assert_eq!(deletions(&events).len(), 2);
}

#[tokio::test]
async fn test_cleanup_failure_does_not_fail_deletion() {
    let harness = TestHarness::new();
    let id = harness.add(10 * GB, 10 * GB).await.inventory.id;
    let sloppy = RecordingDependent::refusing("temp-files", CascadeAction::DeletionCleanup);
    harness.ctx().cascade.register(sloppy.clone());

    harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Permissive,
            },
        )
        .await
        .unwrap();

    assert!(harness.record(id).await.is_none());
    let seen = &sloppy;
    assert!(eventually(move || async move { seen.saw(CascadeAction::DeletionCleanup) }).await);
}

#[tokio::test]
async fn test_delete_resumes_from_pending_delete() {
    let harness = TestHarness::new();
    let id = harness.add(10 * GB, 10 * GB).await.inventory.id;
    harness
        .manager
        .send(
            id,
            Command::ChangeState {
                event: StateEvent::PreDelete,
            },
        )
        .await
        .unwrap();

    harness
        .manager
        .send(
            id,
            Command::Delete {
                mode: DeletionMode::Permissive,
            },
        )
        .await
        .unwrap();
    assert!(harness.record(id).await.is_none());
}
