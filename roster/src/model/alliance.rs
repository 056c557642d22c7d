use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warroom_core::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: RecordId,
    pub name: String,
    /// short uppercase tag shown next to member names
    pub tag: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(Alliance);

/// A sign-up code handed out by officers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationCode {
    pub id: RecordId,
    pub alliance_id: RecordId,
    pub code: String,
    pub description: Option<String>,
    pub created_by: Option<RecordId>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<RecordId>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(InvitationCode);

impl InvitationCode {
    /// Active and not yet redeemed.
    pub fn is_available(&self) -> bool { self.is_active && self.used_by.is_none() }
}
