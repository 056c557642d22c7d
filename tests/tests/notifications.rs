mod common;
use std::time::Duration;

use anyhow::Result;
use common::*;
use warroom_core::{EngineConfig, OperationFailed, OperationKind, OptimisticCollection, RejectionKind, RemoteError, Settlement};
use warroom_signals::{Get, Subscribe, Wait};

#[tokio::test]
async fn test_failures_reach_closure_and_channel_listeners() -> Result<()> {
    let engine = notes(&[("1", "a")]);
    let log = FailureLog::default();
    let _closure = engine.failures().listen(log.listener());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<OperationFailed>();
    let _channel = engine.failures().listen(tx);

    engine.update(&"1".into(), |n| Note { name: "b".into(), ..n.clone() }, || async { Err(RemoteError::rejected(RejectionKind::Unauthorized, "officers only")) }).settled().await;

    let via_closure = log.take();
    assert_eq!(via_closure.len(), 1);
    assert_eq!(via_closure[0].kind, OperationKind::Update);
    assert_eq!(via_closure[0].user_message(), "You don't have permission to save this.");

    let via_channel = rx.recv().await.expect("channel listener notified");
    assert_eq!(via_channel, via_closure[0]);
    assert_eq!(engine.last_failure(), Some(via_channel));
    Ok(())
}

#[tokio::test]
async fn test_dropped_guard_stops_notices() -> Result<()> {
    let engine = notes(&[("1", "a")]);
    let log = FailureLog::default();
    let guard = engine.failures().listen(log.listener());
    drop(guard);

    engine.remove(&"1".into(), || async { Err(RemoteError::transport("offline")) }).settled().await;
    assert!(log.take().is_empty());
    assert!(engine.last_failure().is_some());
    Ok(())
}

#[tokio::test]
async fn test_next_dispatch_clears_last_failure() -> Result<()> {
    let engine = notes(&[("1", "a")]);
    engine.remove(&"1".into(), || async { Err(RemoteError::transport("offline")) }).settled().await;
    assert!(engine.last_failure().is_some());

    let (gate, remote) = Gate::new();
    let dispatched = engine.insert(note("temp-2", "b"), remote);
    assert_eq!(engine.last_failure(), None);
    assert!(engine.is_pending());
    gate.succeed(note("2", "b"));
    dispatched.settled().await;
    assert!(!engine.is_pending());
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_transient_and_rolls_back() -> Result<()> {
    let config = EngineConfig::default().with_remote_timeout(Duration::from_millis(25));
    let engine = OptimisticCollection::with_items("notes", vec![note("1", "a")], config)?;
    let log = FailureLog::default();
    let _guard = engine.failures().listen(log.listener());

    let (_gate, remote) = Gate::<()>::new();
    let failure = match engine.remove(&"1".into(), remote).settled().await {
        Settlement::RolledBack(failure) => failure,
        other => panic!("expected rollback, got {other:?}"),
    };
    assert_eq!(failure.reason, RemoteError::Timeout(Duration::from_millis(25)));
    assert!(failure.is_transient());
    assert!(failure.user_message().contains("try again"));
    assert_eq!(log.take(), vec![failure]);
    assert_eq!(engine.snapshot(), vec![note("1", "a")]);
    Ok(())
}

#[tokio::test]
async fn test_views_follow_the_signal() -> Result<()> {
    let engine = notes(&[]);
    let view = engine.signal();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<Note>>();
    let _sub = view.subscribe(tx);

    let (gate, remote) = Gate::new();
    let dispatched = engine.insert(note("temp-1", "draft"), remote);
    assert_eq!(rx.recv().await, Some(vec![note("temp-1", "draft")]));

    gate.succeed(note("1", "final"));
    let shown = view.wait_for(|rows: &Vec<Note>| rows.first().filter(|n| n.id == "1").map(|n| n.name.clone())).await;
    assert_eq!(shown, "final");
    assert_eq!(view.get(), engine.snapshot());
    dispatched.settled().await;
    Ok(())
}
