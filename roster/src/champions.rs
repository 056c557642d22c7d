use std::sync::{Arc, RwLock};

use tracing::debug;
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Scope};

use crate::{
    error::RosterError,
    model::{Champion, ChampionClass, OwnedChampion, Rank, Rarity},
    screen::{List, Policy},
};

/// One member's champion roster, checked against the read-only catalog.
pub struct ChampionRoster {
    owned: List<OwnedChampion>,
    catalog_gateway: Arc<dyn Gateway<Champion>>,
    catalog: RwLock<Vec<Champion>>,
    owner: RwLock<Option<RecordId>>,
    policy: Policy,
}

impl ChampionRoster {
    pub fn new(
        gateway: Arc<dyn Gateway<OwnedChampion>>,
        catalog: Arc<dyn Gateway<Champion>>,
        policy: Policy,
        config: EngineConfig,
    ) -> Self {
        Self {
            owned: List::new("user_champions", gateway, config),
            catalog_gateway: catalog,
            catalog: RwLock::new(Vec::new()),
            owner: RwLock::new(None),
            policy,
        }
    }

    pub fn list(&self) -> &List<OwnedChampion> { &self.owned }

    pub fn champions(&self) -> Vec<OwnedChampion> { self.owned.snapshot() }

    pub fn catalog(&self) -> Vec<Champion> { self.catalog.read().expect("catalog lock poisoned").clone() }

    pub fn owner(&self) -> Option<RecordId> { self.owner.read().expect("owner lock poisoned").clone() }

    /// Load the catalog and `user`'s roster. Anyone in an alliance may view anyone's roster.
    pub async fn load(&self, ctx: &Context, user: &RecordId) -> Result<usize, RosterError> {
        ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        let catalog = self.catalog_gateway.list(&Scope::all().order("name")).await.into_result()?;
        *self.catalog.write().expect("catalog lock poisoned") = catalog;
        let count = self.owned.load(&Scope::all().eq("user_id", user)).await?;
        *self.owner.write().expect("owner lock poisoned") = Some(user.clone());
        Ok(count)
    }

    pub fn champion(&self, id: &RecordId) -> Option<Champion> { self.catalog.read().expect("catalog lock poisoned").iter().find(|c| &c.id == id).cloned() }

    pub fn add_champion(&self, ctx: &Context, champion_id: &RecordId, rarity: Rarity, rank: Rank) -> Result<Dispatched<OwnedChampion>, RosterError> {
        let owner = self.writable(ctx)?;
        let champion = self.champion(champion_id).ok_or_else(|| RosterError::unknown("champion", champion_id))?;
        if self.owned.snapshot().iter().any(|o| &o.champion_id == champion_id && o.rarity == rarity) {
            return Err(RosterError::invalid("champion", format!("{rarity} {} is already in the roster", champion.name)));
        }

        let draft = OwnedChampion {
            id: self.owned.engine().provisional_id(),
            user_id: owner,
            champion_id: champion_id.clone(),
            rarity,
            rank,
            created_at: None,
            updated_at: None,
        };
        debug!(user = %ctx.user_id, champion = %champion.name, %rarity, %rank, "adding champion");
        Ok(self.owned.create(draft))
    }

    pub fn remove_champion(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<OwnedChampion>, RosterError> {
        self.writable(ctx)?;
        self.owned.require("owned champion", id)?;
        Ok(self.owned.delete(id))
    }

    pub fn set_rank(&self, ctx: &Context, id: &RecordId, rank: Rank) -> Result<Dispatched<OwnedChampion>, RosterError> {
        self.writable(ctx)?;
        self.owned.require("owned champion", id)?;
        Ok(self.owned.save(id, |o| OwnedChampion { rank, ..o.clone() }))
    }

    pub fn set_rarity(&self, ctx: &Context, id: &RecordId, rarity: Rarity) -> Result<Dispatched<OwnedChampion>, RosterError> {
        self.writable(ctx)?;
        let current = self.owned.require("owned champion", id)?;
        let clash = self.owned.snapshot().iter().any(|o| &o.id != id && o.champion_id == current.champion_id && o.rarity == rarity);
        if clash {
            return Err(RosterError::invalid("rarity", format!("a {rarity} copy is already in the roster")));
        }
        Ok(self.owned.save(id, |o| OwnedChampion { rarity, ..o.clone() }))
    }

    /// Owned champions whose catalog class is `class`, in roster order.
    pub fn by_class(&self, class: ChampionClass) -> Vec<OwnedChampion> {
        let catalog = self.catalog.read().expect("catalog lock poisoned");
        self.owned
            .snapshot()
            .into_iter()
            .filter(|owned| catalog.iter().any(|c| c.id == owned.champion_id && c.class == class))
            .collect()
    }

    /// Who the loaded roster belongs to, if `ctx` may write it.
    fn writable(&self, ctx: &Context) -> Result<RecordId, RosterError> {
        let owner = self.owner().ok_or_else(|| RosterError::invalid("roster", "not loaded"))?;
        self.policy.check_write(ctx, Resource::Champions, Some(&owner))?;
        Ok(owner)
    }
}
