use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warroom_core::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battlegroup {
    pub id: RecordId,
    pub alliance_id: RecordId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(Battlegroup);

/// Places one member in one battlegroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlegroupMember {
    pub id: RecordId,
    pub battlegroup_id: RecordId,
    pub user_id: RecordId,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(BattlegroupMember);
