use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warroom_core::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarResult {
    Upcoming,
    Win,
    Loss,
    Draw,
}

impl WarResult {
    pub fn is_completed(&self) -> bool { !matches!(self, WarResult::Upcoming) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct War {
    pub id: RecordId,
    pub alliance_id: RecordId,
    pub season_id: Option<RecordId>,
    pub opponent_name: String,
    pub tier: u32,
    pub war_date: DateTime<Utc>,
    pub result: WarResult,
    pub alliance_score: Option<u32>,
    pub opponent_score: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(War);

/// A member's defender placed on a map node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseNode {
    pub id: RecordId,
    pub war_id: RecordId,
    pub battlegroup_id: RecordId,
    pub user_id: RecordId,
    pub node_number: u8,
    pub champion_id: Option<RecordId>,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(DefenseNode);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPosition {
    Left,
    Center,
    Right,
}

/// An attacker assigned to clear a node along a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackAssignment {
    pub id: RecordId,
    pub war_id: RecordId,
    pub battlegroup_id: RecordId,
    pub node_number: u8,
    pub path_number: u8,
    pub path_type: String,
    pub position: PathPosition,
    pub assigned_champion_id: Option<RecordId>,
    pub assigned_by: Option<RecordId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(AttackAssignment);
