use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info};
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Scope};

use crate::{
    error::RosterError,
    model::{Battlegroup, BattlegroupMember},
    screen::{settle_all, List, Policy},
};

pub const MAX_BATTLEGROUPS: usize = 3;
pub const MAX_MEMBERS_PER_BATTLEGROUP: usize = 10;
pub const MAX_ASSIGNED_MEMBERS: usize = MAX_BATTLEGROUPS * MAX_MEMBERS_PER_BATTLEGROUP;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattlegroupSummary {
    pub battlegroups: usize,
    pub assigned: usize,
    pub capacity: usize,
    /// (battlegroup, member count) in board order
    pub per_group: Vec<(RecordId, usize)>,
}

/// Battlegroups of an alliance and who sits in each.
pub struct BattlegroupBoard {
    groups: List<Battlegroup>,
    placements: List<BattlegroupMember>,
    policy: Policy,
}

impl BattlegroupBoard {
    pub fn new(
        groups: Arc<dyn Gateway<Battlegroup>>,
        placements: Arc<dyn Gateway<BattlegroupMember>>,
        policy: Policy,
        config: EngineConfig,
    ) -> Self {
        Self { groups: List::new("battlegroups", groups, config.clone()), placements: List::new("battlegroup_members", placements, config), policy }
    }

    pub fn groups(&self) -> &List<Battlegroup> { &self.groups }

    pub fn placements(&self) -> &List<BattlegroupMember> { &self.placements }

    pub fn battlegroups(&self) -> Vec<Battlegroup> { self.groups.snapshot() }

    pub fn members_of(&self, battlegroup: &RecordId) -> Vec<BattlegroupMember> {
        self.placements.snapshot().into_iter().filter(|p| &p.battlegroup_id == battlegroup).collect()
    }

    pub fn battlegroup_of(&self, user: &RecordId) -> Option<RecordId> {
        self.placements.snapshot().into_iter().find(|p| &p.user_id == user).map(|p| p.battlegroup_id)
    }

    pub async fn load(&self, ctx: &Context) -> Result<(), RosterError> {
        let alliance = ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        self.groups.load(&Scope::all().eq("alliance_id", alliance).order("name")).await?;
        let ids: HashSet<RecordId> = self.groups.snapshot().into_iter().map(|g| g.id).collect();
        let placed = self.placements.load_where(&Scope::all(), |p| ids.contains(&p.battlegroup_id)).await?;
        info!(alliance = %alliance, groups = ids.len(), placed, "battlegroup board loaded");
        Ok(())
    }

    pub fn create_battlegroup(&self, ctx: &Context, name: &str) -> Result<Dispatched<Battlegroup>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        let alliance = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::invalid("name", "must not be empty"));
        }
        let groups = self.groups.snapshot();
        if groups.len() >= MAX_BATTLEGROUPS {
            return Err(RosterError::CapacityExceeded { what: "alliance", limit: MAX_BATTLEGROUPS });
        }
        if groups.iter().any(|g| g.name.eq_ignore_ascii_case(name)) {
            return Err(RosterError::invalid("name", format!("{name} already exists")));
        }

        let draft = Battlegroup { id: self.groups.engine().provisional_id(), alliance_id: alliance, name: name.to_string(), created_at: None, updated_at: None };
        Ok(self.groups.create(draft))
    }

    /// Load the board and create the default "Battlegroup 1" to "Battlegroup 3" a new alliance
    /// starts with, skipping names already taken. Returns the groups created.
    pub async fn seed_defaults(&self, ctx: &Context) -> Result<Vec<Battlegroup>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        self.load(ctx).await?;
        let mut dispatched = Vec::new();
        for n in 1..=MAX_BATTLEGROUPS {
            let name = format!("Battlegroup {n}");
            let groups = self.groups.snapshot();
            if groups.len() >= MAX_BATTLEGROUPS {
                break;
            }
            if !groups.iter().any(|g| g.name.eq_ignore_ascii_case(&name)) {
                dispatched.push(self.create_battlegroup(ctx, &name)?);
            }
        }
        settle_all("seeding battlegroups", dispatched).await
    }

    pub fn rename_battlegroup(&self, ctx: &Context, id: &RecordId, name: &str) -> Result<Dispatched<Battlegroup>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        self.groups.require("battlegroup", id)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(RosterError::invalid("name", "must not be empty"));
        }
        if self.groups.snapshot().iter().any(|g| &g.id != id && g.name.eq_ignore_ascii_case(&name)) {
            return Err(RosterError::invalid("name", format!("{name} already exists")));
        }
        Ok(self.groups.save(id, |g| Battlegroup { name, ..g.clone() }))
    }

    /// Unassigns every member of the group and waits for those removals to settle. The group
    /// is deleted only when all of them succeed; otherwise it stays, and placements whose
    /// removal failed are rolled back into it.
    pub async fn delete_battlegroup(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<Battlegroup>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        self.groups.require("battlegroup", id)?;
        let unassigned = self
            .members_of(id)
            .into_iter()
            .map(|placement| {
                debug!(battlegroup = %id, user = %placement.user_id, "unassigning before delete");
                self.placements.delete(&placement.id)
            })
            .collect();
        settle_all("unassigning battlegroup members", unassigned).await?;
        Ok(self.groups.delete(id))
    }

    pub fn assign_member(&self, ctx: &Context, battlegroup: &RecordId, user: &RecordId) -> Result<Dispatched<BattlegroupMember>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        self.groups.require("battlegroup", battlegroup)?;

        let placements = self.placements.snapshot();
        if placements.iter().any(|p| &p.user_id == user) {
            return Err(RosterError::invalid("user", format!("{user} is already in a battlegroup")));
        }
        if placements.len() >= MAX_ASSIGNED_MEMBERS {
            return Err(RosterError::CapacityExceeded { what: "alliance battlegroups", limit: MAX_ASSIGNED_MEMBERS });
        }
        if placements.iter().filter(|p| &p.battlegroup_id == battlegroup).count() >= MAX_MEMBERS_PER_BATTLEGROUP {
            return Err(RosterError::CapacityExceeded { what: "battlegroup", limit: MAX_MEMBERS_PER_BATTLEGROUP });
        }

        let draft = BattlegroupMember {
            id: self.placements.engine().provisional_id(),
            battlegroup_id: battlegroup.clone(),
            user_id: user.clone(),
            created_at: None,
            updated_at: None,
        };
        Ok(self.placements.create(draft))
    }

    /// Take `user` out of whichever battlegroup they are in.
    pub fn unassign_member(&self, ctx: &Context, user: &RecordId) -> Result<Dispatched<BattlegroupMember>, RosterError> {
        self.policy.check_write(ctx, Resource::Battlegroups, None)?;
        let placement = self.placements.snapshot().into_iter().find(|p| &p.user_id == user).ok_or_else(|| RosterError::unknown("battlegroup member", user))?;
        Ok(self.placements.delete(&placement.id))
    }

    pub fn summary(&self) -> BattlegroupSummary {
        let groups = self.groups.snapshot();
        let placements = self.placements.snapshot();
        let per_group: Vec<(RecordId, usize)> =
            groups.iter().map(|g| (g.id.clone(), placements.iter().filter(|p| p.battlegroup_id == g.id).count())).collect();
        BattlegroupSummary { battlegroups: groups.len(), assigned: placements.len(), capacity: MAX_ASSIGNED_MEMBERS, per_group }
    }
}
