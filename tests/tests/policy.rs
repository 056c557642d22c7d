mod common;
use std::sync::Arc;

use anyhow::Result;
use warroom_core::{AccessDenied, Context, EngineConfig, MemoryGateway, Resource, Role, RolePolicy};
use warroom_roster::{
    model::{Champion, ChampionClass, OwnedChampion, Rank, Rarity, War},
    ChampionRoster, RosterError, WarDraft, WarLog,
};

fn member(id: &str) -> Context { Context::new(id, Role::Member).in_alliance("a1") }

/// Denied writes never touch the list and never reach the gateway.
#[tokio::test]
async fn test_denied_writes_leave_no_trace() -> Result<()> {
    let wars = Arc::new(MemoryGateway::<War>::new("wars"));
    let log = WarLog::new(wars.clone(), Arc::new(RolePolicy::new()), EngineConfig::default());
    log.load(&member("u2"), None).await?;

    let draft = WarDraft { opponent_name: "Dark Legion".into(), tier: 3, war_date: chrono::Utc::now(), season_id: None };
    let denied = log.record_war(&member("u2"), draft.clone());
    assert!(matches!(denied, Err(RosterError::AccessDenied(AccessDenied::OfficerOnly(Resource::Wars)))));
    assert!(log.wars().is_empty());
    assert_eq!(wars.calls().create, 0);

    let officer = Context::new("u1", Role::Officer).in_alliance("a1");
    log.record_war(&officer, draft)?.settled().await;
    assert_eq!(wars.calls().create, 1);
    Ok(())
}

#[tokio::test]
async fn test_members_curate_only_their_own_roster() -> Result<()> {
    let catalog = Arc::new(MemoryGateway::new("champions").with_rows([Champion { id: "c1".into(), name: "Hercules".into(), class: ChampionClass::Cosmic }]));
    let owned = Arc::new(MemoryGateway::<OwnedChampion>::new("user_champions"));
    let roster = ChampionRoster::new(owned.clone(), catalog, Arc::new(RolePolicy::new()), EngineConfig::default());

    roster.load(&member("u3"), &"u2".into()).await?;
    assert!(matches!(
        roster.add_champion(&member("u3"), &"c1".into(), Rarity::SevenStar, Rank::R1),
        Err(RosterError::AccessDenied(AccessDenied::NotOwner { .. }))
    ));

    let homeless = Context::new("u2", Role::Member);
    assert!(matches!(roster.add_champion(&homeless, &"c1".into(), Rarity::SevenStar, Rank::R1), Err(RosterError::AccessDenied(AccessDenied::NoAlliance))));

    roster.add_champion(&member("u2"), &"c1".into(), Rarity::SevenStar, Rank::R1)?.settled().await;
    assert_eq!(owned.rows().len(), 1);
    assert_eq!(owned.rows()[0].user_id, "u2");
    Ok(())
}
