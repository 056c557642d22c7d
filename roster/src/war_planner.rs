use std::{
    ops::RangeInclusive,
    sync::{Arc, RwLock},
};

use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Scope};

use crate::{
    error::RosterError,
    model::{AttackAssignment, DefenseNode, PathPosition},
    screen::{List, Policy},
};

/// Node numbers on the war map.
pub const NODE_RANGE: RangeInclusive<u8> = 1..=50;

/// Where an attacker goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackPlan {
    pub battlegroup_id: RecordId,
    pub node_number: u8,
    pub path_number: u8,
    pub path_type: String,
    pub position: PathPosition,
    pub champion_id: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    pub defended: usize,
    pub attacked: usize,
    pub total: usize,
}

/// Defense placements and attack assignments for one war.
pub struct WarPlanner {
    defense: List<DefenseNode>,
    attack: List<AttackAssignment>,
    war: RwLock<Option<RecordId>>,
    policy: Policy,
}

fn check_node(node_number: u8) -> Result<(), RosterError> {
    if NODE_RANGE.contains(&node_number) {
        Ok(())
    } else {
        Err(RosterError::invalid("node_number", format!("{node_number} is outside {NODE_RANGE:?}")))
    }
}

impl WarPlanner {
    pub fn new(
        defense: Arc<dyn Gateway<DefenseNode>>,
        attack: Arc<dyn Gateway<AttackAssignment>>,
        policy: Policy,
        config: EngineConfig,
    ) -> Self {
        Self {
            defense: List::new("defense_nodes", defense, config.clone()),
            attack: List::new("attack_assignments", attack, config),
            war: RwLock::new(None),
            policy,
        }
    }

    pub fn defense(&self) -> &List<DefenseNode> { &self.defense }

    pub fn attack(&self) -> &List<AttackAssignment> { &self.attack }

    /// Load one war's plan. The caller must belong to an alliance.
    pub async fn load(&self, ctx: &Context, war: &RecordId) -> Result<(), RosterError> {
        ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        self.defense.load(&Scope::all().eq("war_id", war).order("node_number")).await?;
        self.attack.load(&Scope::all().eq("war_id", war).order("node_number")).await?;
        *self.war.write().expect("war lock poisoned") = Some(war.clone());
        Ok(())
    }

    pub fn defender_at(&self, battlegroup: &RecordId, node_number: u8) -> Option<DefenseNode> {
        self.defense.snapshot().into_iter().find(|d| &d.battlegroup_id == battlegroup && d.node_number == node_number)
    }

    /// Place `user`'s `champion` on a node. Members may place themselves.
    pub fn assign_defender(
        &self,
        ctx: &Context,
        battlegroup: &RecordId,
        node_number: u8,
        user: &RecordId,
        champion: Option<RecordId>,
    ) -> Result<Dispatched<DefenseNode>, RosterError> {
        self.policy.check_write(ctx, Resource::DefenseNodes, Some(user))?;
        let war = self.war()?;
        check_node(node_number)?;
        if let Some(existing) = self.defender_at(battlegroup, node_number) {
            return Err(RosterError::invalid("node_number", format!("node {node_number} is already held by {}", existing.user_id)));
        }
        if let Some(champion) = &champion {
            let placed_twice = self.defense.snapshot().iter().any(|d| &d.user_id == user && d.champion_id.as_ref() == Some(champion));
            if placed_twice {
                return Err(RosterError::invalid("champion", "already placed on another node"));
            }
        }

        let draft = DefenseNode {
            id: self.defense.engine().provisional_id(),
            war_id: war,
            battlegroup_id: battlegroup.clone(),
            user_id: user.clone(),
            node_number,
            champion_id: champion,
            comment: None,
            created_at: None,
            updated_at: None,
        };
        Ok(self.defense.create(draft))
    }

    pub fn comment_defender(&self, ctx: &Context, id: &RecordId, comment: &str) -> Result<Dispatched<DefenseNode>, RosterError> {
        let node = self.defense.require("defense node", id)?;
        self.policy.check_write(ctx, Resource::DefenseNodes, Some(&node.user_id))?;
        let comment = Some(comment.trim().to_string()).filter(|c| !c.is_empty());
        Ok(self.defense.save(id, |d| DefenseNode { comment, ..d.clone() }))
    }

    pub fn clear_defender(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<DefenseNode>, RosterError> {
        let node = self.defense.require("defense node", id)?;
        self.policy.check_write(ctx, Resource::DefenseNodes, Some(&node.user_id))?;
        Ok(self.defense.delete(id))
    }

    /// Officers only. One attacker per node position within a battlegroup.
    pub fn assign_attacker(&self, ctx: &Context, plan: AttackPlan) -> Result<Dispatched<AttackAssignment>, RosterError> {
        self.policy.check_write(ctx, Resource::AttackAssignments, None)?;
        let war = self.war()?;
        check_node(plan.node_number)?;
        let taken = self
            .attack
            .snapshot()
            .iter()
            .any(|a| a.battlegroup_id == plan.battlegroup_id && a.node_number == plan.node_number && a.position == plan.position);
        if taken {
            return Err(RosterError::invalid("position", format!("node {} {:?} is already assigned", plan.node_number, plan.position)));
        }

        let draft = AttackAssignment {
            id: self.attack.engine().provisional_id(),
            war_id: war,
            battlegroup_id: plan.battlegroup_id,
            node_number: plan.node_number,
            path_number: plan.path_number,
            path_type: plan.path_type,
            position: plan.position,
            assigned_champion_id: plan.champion_id,
            assigned_by: Some(ctx.user_id.clone()),
            created_at: None,
            updated_at: None,
        };
        Ok(self.attack.create(draft))
    }

    pub fn clear_attacker(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<AttackAssignment>, RosterError> {
        self.policy.check_write(ctx, Resource::AttackAssignments, None)?;
        self.attack.require("attack assignment", id)?;
        Ok(self.attack.delete(id))
    }

    /// Distinct nodes with a defender and with at least one attacker, for one battlegroup.
    pub fn coverage(&self, battlegroup: &RecordId) -> Coverage {
        let mut defended: Vec<u8> = self.defense.snapshot().iter().filter(|d| &d.battlegroup_id == battlegroup).map(|d| d.node_number).collect();
        let mut attacked: Vec<u8> = self.attack.snapshot().iter().filter(|a| &a.battlegroup_id == battlegroup).map(|a| a.node_number).collect();
        defended.sort_unstable();
        defended.dedup();
        attacked.sort_unstable();
        attacked.dedup();
        Coverage { defended: defended.len(), attacked: attacked.len(), total: NODE_RANGE.len() }
    }

    fn war(&self) -> Result<RecordId, RosterError> {
        self.war.read().expect("war lock poisoned").clone().ok_or_else(|| RosterError::invalid("war", "no war loaded"))
    }
}
