mod common;
use std::sync::Arc;

use anyhow::Result;
use warroom_core::{Context, EngineConfig, MemoryGateway, PermissiveAgent, RejectionKind, RemoteError, Role, RolePolicy, Settlement};
use warroom_roster::{
    battlegroups::{MAX_BATTLEGROUPS, MAX_MEMBERS_PER_BATTLEGROUP},
    model::{Battlegroup, BattlegroupMember, Member},
    BattlegroupBoard, MemberRoster, RosterError,
};

fn leader() -> Context { Context::new("lead", Role::Leader).in_alliance("a1") }

fn seed_members() -> Arc<MemoryGateway<Member>> {
    let rows = (0..12).map(|i| Member::new(format!("u{i}").into(), format!("player{i:02}"), Role::Member).in_alliance("a1".into()));
    Arc::new(MemoryGateway::new("profiles").with_unique("username").with_rows(rows))
}

#[tokio::test]
async fn test_server_conflict_rolls_back_member() -> Result<()> {
    let gateway = seed_members();
    let roster = MemberRoster::new(gateway.clone(), Arc::new(RolePolicy::new()), EngineConfig::default());
    roster.load(&leader()).await?;
    assert_eq!(roster.members().len(), 12);

    // another officer took the name after we loaded
    gateway.fail_next(RemoteError::rejected(RejectionKind::Conflict, "profiles.username \"rookie\""));
    let dispatched = roster.add_member(&leader(), "Rookie", Role::Member)?;
    assert_eq!(dispatched.snapshot().len(), 13);

    let failure = dispatched.settled().await.failure().cloned().expect("conflict should fail");
    assert!(failure.user_message().contains("already exists"));
    assert_eq!(roster.members().len(), 12);
    assert_eq!(roster.list().engine().last_failure(), Some(failure));
    Ok(())
}

#[tokio::test]
async fn test_refresh_refused_while_edits_are_in_flight() -> Result<()> {
    let gateway = seed_members();
    let roster = MemberRoster::new(gateway.clone(), Arc::new(PermissiveAgent::new()), EngineConfig::default());
    roster.load(&leader()).await?;

    let release = gateway.hold_next();
    let dispatched = roster.rename(&leader(), &"u3".into(), "Renamed")?;
    // let the update reach the gateway and park on the hold
    tokio::task::yield_now().await;
    assert!(matches!(roster.load(&leader()).await, Err(RosterError::Collection(_))));
    assert_eq!(roster.members().iter().filter(|m| m.username == "renamed").count(), 1);

    release.release();
    assert!(dispatched.settled().await.is_success());
    assert_eq!(roster.load(&leader()).await?, 12);
    assert!(roster.members().iter().any(|m| m.username == "renamed"));
    Ok(())
}

#[tokio::test]
async fn test_fill_battlegroups_to_capacity() -> Result<()> {
    let board = BattlegroupBoard::new(
        Arc::new(MemoryGateway::<Battlegroup>::new("battlegroups")),
        Arc::new(MemoryGateway::<BattlegroupMember>::new("battlegroup_members")),
        Arc::new(RolePolicy::new()),
        EngineConfig::default(),
    );
    board.load(&leader()).await?;

    let mut groups = Vec::new();
    for n in 1..=MAX_BATTLEGROUPS {
        let group = board.create_battlegroup(&leader(), &format!("BG{n}"))?.settled().await;
        groups.push(group.record().cloned().expect("battlegroup created").id);
    }
    assert!(matches!(board.create_battlegroup(&leader(), "BG4"), Err(RosterError::CapacityExceeded { .. })));

    // dispatch every placement before any settles
    let mut pending = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        for slot in 0..MAX_MEMBERS_PER_BATTLEGROUP {
            pending.push(board.assign_member(&leader(), group, &format!("u{i}-{slot}").into())?);
        }
    }
    assert_eq!(board.summary().assigned, 30);
    assert!(matches!(board.assign_member(&leader(), &groups[0], &"late".into()), Err(RosterError::CapacityExceeded { .. })));

    for dispatched in pending {
        assert!(matches!(dispatched.settled().await, Settlement::Reconciled(Some(_))));
    }
    let summary = board.summary();
    assert_eq!(summary.assigned, summary.capacity);
    assert!(board.placements().snapshot().iter().all(|p| !p.id.is_provisional()));
    Ok(())
}
