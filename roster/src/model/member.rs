use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warroom_core::{RecordId, Role};

/// A player profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: RecordId,
    pub username: String,
    pub role: Role,
    pub alliance_id: Option<RecordId>,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(Member);

impl Member {
    pub fn new(id: RecordId, username: impl Into<String>, role: Role) -> Self {
        Self { id, username: username.into(), role, alliance_id: None, avatar_url: None, created_at: None, updated_at: None }
    }

    pub fn in_alliance(mut self, alliance_id: RecordId) -> Self {
        self.alliance_id = Some(alliance_id);
        self
    }
}

/// Lowercase, trimmed, inner whitespace runs collapsed to `_`.
pub fn normalize_username(raw: &str) -> String { raw.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase() }
