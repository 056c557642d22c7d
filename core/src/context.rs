use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Alliance role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Officer,
    Member,
}

impl Role {
    /// Leaders carry every officer permission.
    pub fn is_officer(&self) -> bool { matches!(self, Role::Leader | Role::Officer) }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Officer => "officer",
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leader" => Ok(Role::Leader),
            "officer" => Ok(Role::Officer),
            "member" => Ok(Role::Member),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Who is acting. Handed explicitly to every operation that needs authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub user_id: RecordId,
    pub role: Role,
    pub alliance_id: Option<RecordId>,
}

impl Context {
    pub fn new(user_id: impl Into<RecordId>, role: Role) -> Self { Self { user_id: user_id.into(), role, alliance_id: None } }

    pub fn in_alliance(mut self, alliance_id: impl Into<RecordId>) -> Self {
        self.alliance_id = Some(alliance_id.into());
        self
    }

    pub fn is_officer(&self) -> bool { self.role.is_officer() }

    pub fn is_user(&self, id: &RecordId) -> bool { &self.user_id == id }
}
