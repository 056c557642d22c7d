mod common;
use anyhow::Result;
use common::*;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use warroom_core::{OperationKind, RejectionKind, RemoteError, Settlement};

#[tokio::test]
async fn test_scenario_a_remove_rolls_back() -> Result<()> {
    let engine = notes(&[("1", "Alice")]);
    let dispatched = engine.remove(&"1".into(), || async { Err(RemoteError::transport("offline")) });
    assert!(dispatched.snapshot().is_empty());
    assert!(engine.snapshot().is_empty());

    dispatched.settled().await;
    assert_eq!(engine.snapshot(), vec![note("1", "Alice")]);
    Ok(())
}

#[tokio::test]
async fn test_scenario_b_insert_reconciles() -> Result<()> {
    let engine = notes(&[]);
    let dispatched = engine.insert(note("temp-42", "Bob"), || async { Ok(note("7", "Bob")) });
    assert_eq!(dispatched.snapshot(), [note("temp-42", "Bob")]);

    dispatched.settled().await;
    assert_eq!(engine.snapshot(), vec![note("7", "Bob")]);
    Ok(())
}

#[tokio::test]
async fn test_scenario_c_remove_preserves_order() -> Result<()> {
    let engine = notes(&[("1", ""), ("2", ""), ("3", "")]);
    let settlement = engine.remove(&"2".into(), || async { Ok(()) }).settled().await;
    assert_eq!(settlement, Settlement::Reconciled(None));
    assert_eq!(ids(&engine.snapshot()), ["1", "3"]);
    Ok(())
}

#[tokio::test]
async fn test_insert_success_takes_provisional_position() -> Result<()> {
    let engine = notes(&[("1", "a"), ("2", "b")]);
    let (gate, remote) = Gate::new();
    let dispatched = engine.insert(note("temp-x", "c"), remote);

    // a later insert lands behind the provisional row while it is pending
    engine.insert(note("temp-y", "d"), || async { Ok(note("4", "d")) }).settled().await;
    gate.succeed(note("3", "c"));
    dispatched.settled().await;

    assert_eq!(ids(&engine.snapshot()), ["1", "2", "3", "4"]);
    Ok(())
}

#[tokio::test]
async fn test_insert_failure_restores_identity_set() -> Result<()> {
    let engine = notes(&[("1", "a"), ("2", "b")]);
    let before = engine.snapshot();
    for _ in 0..3 {
        let settlement = engine.insert(engine_provisional(&engine), || async { Err(RemoteError::rejected(RejectionKind::Validation, "bad")) }).settled().await;
        assert!(matches!(settlement, Settlement::RolledBack(_)));
        assert_eq!(engine.snapshot(), before);
    }
    Ok(())
}

fn engine_provisional(engine: &warroom_core::OptimisticCollection<Note>) -> Note { Note { id: engine.provisional_id(), name: "draft".into() } }

#[tokio::test]
async fn test_remove_rollback_at_every_position() -> Result<()> {
    let rows = [("1", "a"), ("2", "b"), ("3", "c"), ("4", "d")];
    for (index, (id, _)) in rows.iter().enumerate() {
        let engine = notes(&rows);
        let before = engine.snapshot();
        let settlement = engine.remove(&(*id).into(), || async { Err(RemoteError::transport("offline")) }).settled().await;
        let failure = settlement.failure().expect("remove should fail");
        assert_eq!(failure.kind, OperationKind::Remove);
        assert_eq!(engine.snapshot(), before, "row {index} not restored in place");
    }
    Ok(())
}

#[tokio::test]
async fn test_remove_rollback_after_rows_above_are_gone() -> Result<()> {
    let engine = notes(&[("1", "a"), ("2", "b"), ("3", "c"), ("4", "d")]);
    let (gate, remote) = Gate::<()>::new();
    let held = engine.remove(&"3".into(), remote);

    engine.remove(&"1".into(), || async { Ok(()) }).settled().await;
    assert_eq!(ids(&engine.snapshot()), ["2", "4"]);

    gate.fail(RemoteError::transport("offline"));
    assert!(matches!(held.settled().await, Settlement::RolledBack(_)));
    assert_eq!(ids(&engine.snapshot()), ["2", "3", "4"]);
    Ok(())
}

#[tokio::test]
async fn test_remove_rollback_anchors_to_row_below() -> Result<()> {
    let engine = notes(&[("1", "a"), ("2", "b"), ("3", "c")]);
    let (gate, remote) = Gate::<()>::new();
    let held = engine.remove(&"2".into(), remote);

    // the row above goes too, and a new row is appended
    engine.remove(&"1".into(), || async { Ok(()) }).settled().await;
    engine.insert(note("temp-n", "n"), || async { Ok(note("5", "n")) }).settled().await;
    assert_eq!(ids(&engine.snapshot()), ["3", "5"]);

    gate.fail(RemoteError::transport("offline"));
    held.settled().await;
    assert_eq!(ids(&engine.snapshot()), ["2", "3", "5"]);
    Ok(())
}

#[tokio::test]
async fn test_update_rollback_has_no_drift() -> Result<()> {
    let engine = notes(&[("1", "a"), ("2", "b")]);
    let before = engine.snapshot();
    for round in 0..5 {
        let dispatched = engine.update(
            &"2".into(),
            move |n| Note { name: format!("{}-{round}", n.name), ..n.clone() },
            || async { Err(RemoteError::Timeout(std::time::Duration::from_millis(5))) },
        );
        assert_eq!(dispatched.snapshot()[1].name, format!("b-{round}"));
        dispatched.settled().await;
        assert_eq!(engine.snapshot(), before);
    }
    Ok(())
}

#[tokio::test]
async fn test_no_double_reconciliation() -> Result<()> {
    let engine = notes(&[]);
    let (first_gate, first_remote) = Gate::new();
    let (second_gate, second_remote) = Gate::new();

    let first = engine.insert(note("temp-1", "first"), first_remote);
    let second = engine.insert(note("temp-2", "second"), second_remote);
    assert_eq!(ids(&engine.snapshot()), ["temp-1", "temp-2"]);

    second_gate.succeed(note("20", "second"));
    assert_eq!(second.settled().await, Settlement::Reconciled(Some(note("20", "second"))));
    first_gate.succeed(note("10", "first"));
    assert_eq!(first.settled().await, Settlement::Reconciled(Some(note("10", "first"))));

    assert_eq!(engine.snapshot(), vec![note("10", "first"), note("20", "second")]);
    Ok(())
}

#[tokio::test]
async fn test_rollback_after_mixed_outcomes_shows_last_confirmed() -> Result<()> {
    let engine = notes(&[("1", "v0")]);
    let (g1, r1) = Gate::new();
    let (g2, r2) = Gate::new();
    let (g3, r3) = Gate::new();

    let rename = |name: &'static str| move |n: &Note| Note { name: name.into(), ..n.clone() };
    let d1 = engine.update(&"1".into(), rename("v1"), r1);
    let d2 = engine.update(&"1".into(), rename("v2"), r2);
    let d3 = engine.update(&"1".into(), rename("v3"), r3);
    assert_eq!(engine.snapshot()[0].name, "v3");

    g2.succeed(note("1", "V2"));
    assert!(matches!(d2.settled().await, Settlement::Superseded(_)));
    assert_eq!(engine.snapshot()[0].name, "v3");

    g3.fail(RemoteError::transport("offline"));
    assert!(matches!(d3.settled().await, Settlement::RolledBack(_)));
    assert_eq!(engine.snapshot()[0].name, "V2");

    // the oldest confirmation arrives last and is stale
    g1.succeed(note("1", "V1"));
    assert!(matches!(d1.settled().await, Settlement::Superseded(_)));
    assert_eq!(engine.snapshot(), vec![note("1", "V2")]);
    assert!(!engine.is_pending());
    Ok(())
}

/// Random settlement orders over several ids. Whatever the order, every id ends up showing
/// the outcome of its newest operation that succeeded, or its original value.
#[tokio::test]
async fn test_random_interleavings_settle_to_newest_success() -> Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    for _ in 0..25 {
        let engine = notes(&[("a", "a0"), ("b", "b0"), ("c", "c0")]);
        let mut gates = Vec::new();
        let mut expected = std::collections::HashMap::from([("a", "a0".to_string()), ("b", "b0".to_string()), ("c", "c0".to_string())]);

        for step in 0..9 {
            let id = ["a", "b", "c"][rng.gen_range(0..3)];
            let name = format!("{id}{}", step + 1);
            let succeeds = rng.gen_bool(0.6);
            if succeeds {
                expected.insert(id, name.to_uppercase());
            }
            let (gate, remote) = Gate::new();
            let speculative = name.clone();
            let dispatched = engine.update(&id.into(), move |n| Note { name: speculative, ..n.clone() }, remote);
            gates.push((gate, dispatched, note(id, &name.to_uppercase()), succeeds));
        }

        gates.shuffle(&mut rng);
        for (gate, dispatched, confirmed, succeeds) in gates {
            if succeeds {
                gate.succeed(confirmed);
            } else {
                gate.fail(RemoteError::transport("flaky"));
            }
            dispatched.settled().await;
        }

        for row in engine.snapshot() {
            assert_eq!(row.name, expected[row.id.as_str()], "id {}", row.id);
        }
        assert_eq!(engine.pending_count(), 0);
    }
    Ok(())
}
