use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{id::RecordId, operation::OperationKind};

/// Why the server declined a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Validation,
    Conflict,
    Unauthorized,
    NotFound,
    Other,
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RejectionKind::Validation => "validation",
            RejectionKind::Conflict => "conflict",
            RejectionKind::Unauthorized => "unauthorized",
            RejectionKind::NotFound => "not found",
            RejectionKind::Other => "other",
        })
    }
}

/// Failure reason reported by (or on behalf of) the Remote Data Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RemoteError {
    /// The request could not complete
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request did not settle in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The request completed but the server declined it
    #[error("rejected ({kind}): {message}")]
    Rejected { kind: RejectionKind, message: String },
}

impl RemoteError {
    pub fn transport(message: impl Into<String>) -> Self { RemoteError::Transport(message.into()) }

    pub fn rejected(kind: RejectionKind, message: impl Into<String>) -> Self { RemoteError::Rejected { kind, message: message.into() } }

    /// True when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool { matches!(self, RemoteError::Transport(_) | RemoteError::Timeout(_)) }

    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            RemoteError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A remote call failed after its speculative change was shown.
///
/// Broadcast on the engine's failure channel and carried by
/// [`crate::engine::Settlement`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} of {target} failed: {reason}")]
pub struct OperationFailed {
    pub kind: OperationKind,
    pub target: RecordId,
    #[source]
    pub reason: RemoteError,
}

impl OperationFailed {
    pub fn new(kind: OperationKind, target: RecordId, reason: RemoteError) -> Self { Self { kind, target, reason } }

    pub fn is_transient(&self) -> bool { self.reason.is_transient() }

    /// Message for a view to show next to the reverted list.
    pub fn user_message(&self) -> String {
        let action = match self.kind {
            OperationKind::Insert => "add",
            OperationKind::Remove => "remove",
            OperationKind::Update => "save",
        };
        match &self.reason {
            RemoteError::Transport(_) | RemoteError::Timeout(_) => {
                format!("Couldn't {action} right now because the server is unreachable. Please try again.")
            }
            RemoteError::Rejected { kind: RejectionKind::Conflict, message } => format!("Couldn't {action}: {message} (already exists)."),
            RemoteError::Rejected { kind: RejectionKind::Unauthorized, .. } => format!("You don't have permission to {action} this."),
            RemoteError::Rejected { kind: RejectionKind::NotFound, .. } => format!("Couldn't {action}: it no longer exists."),
            RemoteError::Rejected { message, .. } => format!("Couldn't {action}: {message}."),
        }
    }
}

/// Violations of the collection's identity invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("duplicate id {0}")]
    DuplicateId(RecordId),

    #[error("id {0} not found")]
    NotFound(RecordId),

    /// A whole-list replacement was attempted while mutations were in flight
    #[error("{0} operation(s) still in flight")]
    Busy(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}
