use thiserror::Error;
use warroom_core::{AccessDenied, CollectionError, OperationFailed, RecordId, RemoteError};

/// Why a screen refused to dispatch, or why a load failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{what} is full ({limit} max)")]
    CapacityExceeded { what: &'static str, limit: usize },

    #[error("unknown {kind} {id}")]
    UnknownRecord { kind: &'static str, id: RecordId },

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("load failed: {0}")]
    Remote(#[from] RemoteError),

    /// A step of a multi-step action failed remotely; later steps were not dispatched.
    #[error("{step} failed: {failure}")]
    StepFailed {
        step: &'static str,
        #[source]
        failure: OperationFailed,
    },
}

impl RosterError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self { RosterError::Validation { field, reason: reason.into() } }

    pub(crate) fn unknown(kind: &'static str, id: &RecordId) -> Self { RosterError::UnknownRecord { kind, id: id.clone() } }
}
