use std::sync::Arc;

use chrono::{DateTime, Utc};
use warroom_core::{AccessDenied, Context, Dispatched, EngineConfig, Gateway, RecordId, Resource, Scope};

use crate::{
    error::RosterError,
    model::{War, WarResult},
    screen::{List, Policy},
};

/// A war to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct WarDraft {
    pub opponent_name: String,
    pub tier: u32,
    pub war_date: DateTime<Utc>,
    pub season_id: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonStats {
    pub total: usize,
    pub completed: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    /// whole percent of completed wars won
    pub win_rate: u32,
}

/// The alliance's war history.
pub struct WarLog {
    wars: List<War>,
    policy: Policy,
}

impl WarLog {
    pub fn new(gateway: Arc<dyn Gateway<War>>, policy: Policy, config: EngineConfig) -> Self { Self { wars: List::new("wars", gateway, config), policy } }

    pub fn list(&self) -> &List<War> { &self.wars }

    pub fn wars(&self) -> Vec<War> { self.wars.snapshot() }

    /// Load the alliance's wars, optionally for one season.
    pub async fn load(&self, ctx: &Context, season: Option<&RecordId>) -> Result<usize, RosterError> {
        let alliance = ctx.alliance_id.as_ref().ok_or(AccessDenied::NoAlliance)?;
        let mut scope = Scope::all().eq("alliance_id", alliance).order("war_date");
        if let Some(season) = season {
            scope = scope.eq("season_id", season);
        }
        self.wars.load(&scope).await
    }

    pub fn record_war(&self, ctx: &Context, draft: WarDraft) -> Result<Dispatched<War>, RosterError> {
        self.policy.check_write(ctx, Resource::Wars, None)?;
        let alliance = ctx.alliance_id.clone().ok_or(AccessDenied::NoAlliance)?;
        let opponent_name = draft.opponent_name.trim().to_string();
        if opponent_name.is_empty() {
            return Err(RosterError::invalid("opponent_name", "must not be empty"));
        }
        if draft.tier == 0 {
            return Err(RosterError::invalid("tier", "tiers start at 1"));
        }

        let war = War {
            id: self.wars.engine().provisional_id(),
            alliance_id: alliance,
            season_id: draft.season_id,
            opponent_name,
            tier: draft.tier,
            war_date: draft.war_date,
            result: WarResult::Upcoming,
            alliance_score: None,
            opponent_score: None,
            created_at: None,
            updated_at: None,
        };
        Ok(self.wars.create(war))
    }

    /// Record the outcome. Scores are required for every result but `Upcoming`.
    pub fn set_result(&self, ctx: &Context, id: &RecordId, result: WarResult, scores: Option<(u32, u32)>) -> Result<Dispatched<War>, RosterError> {
        self.policy.check_write(ctx, Resource::Wars, None)?;
        self.wars.require("war", id)?;
        if result.is_completed() && scores.is_none() {
            return Err(RosterError::invalid("scores", format!("a {result:?} needs both scores")));
        }
        let (alliance_score, opponent_score) = match scores {
            Some((ours, theirs)) => (Some(ours), Some(theirs)),
            None => (None, None),
        };
        Ok(self.wars.save(id, |w| War { result, alliance_score, opponent_score, ..w.clone() }))
    }

    pub fn remove_war(&self, ctx: &Context, id: &RecordId) -> Result<Dispatched<War>, RosterError> {
        self.policy.check_write(ctx, Resource::Wars, None)?;
        self.wars.require("war", id)?;
        Ok(self.wars.delete(id))
    }

    /// Wars whose opponent contains `query` (case-insensitive), optionally with one result.
    pub fn search(&self, query: &str, result: Option<WarResult>) -> Vec<War> {
        let query = query.to_lowercase();
        self.wars
            .snapshot()
            .into_iter()
            .filter(|w| w.opponent_name.to_lowercase().contains(&query) && result.map_or(true, |r| w.result == r))
            .collect()
    }

    pub fn stats(&self) -> SeasonStats {
        let wars = self.wars.snapshot();
        let count = |result: WarResult| wars.iter().filter(|w| w.result == result).count();
        let completed = wars.iter().filter(|w| w.result.is_completed()).count();
        let wins = count(WarResult::Win);
        let win_rate = if completed == 0 { 0 } else { ((wins as f64 / completed as f64) * 100.0).round() as u32 };
        SeasonStats { total: wars.len(), completed, wins, losses: count(WarResult::Loss), draws: count(WarResult::Draw), win_rate }
    }
}
