use serde::{Deserialize, Serialize};

use crate::id::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Remove,
    Update,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationKind::Insert => "insert",
            OperationKind::Remove => "remove",
            OperationKind::Update => "update",
        })
    }
}

/// Lifecycle of a single dispatched mutation.
///
/// `Idle -> Speculative -> Reconciled | RolledBack`. `Superseded` marks a settlement whose
/// effect on the list was discarded because a newer operation on the same id was issued.
/// `Failed` is a failure whose speculative change was kept because rollback is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationState {
    Idle,
    Speculative,
    Reconciled,
    RolledBack,
    Superseded,
    Failed,
}

impl OperationState {
    pub fn is_settled(&self) -> bool { !matches!(self, OperationState::Idle | OperationState::Speculative) }
}

/// Monotonic operation sequence. Ordering between two operations on the same id
/// is decided by comparing their sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Seq(pub(crate) u64);

impl std::fmt::Display for Seq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "#{}", self.0) }
}

/// One in-flight mutation. Created when an intent is dispatched, consumed when its
/// remote call settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub target: RecordId,
    pub seq: Seq,
    state: OperationState,
}

impl PendingOperation {
    pub(crate) fn new(kind: OperationKind, target: RecordId, seq: Seq) -> Self {
        Self { kind, target, seq, state: OperationState::Speculative }
    }

    pub fn state(&self) -> OperationState { self.state }

    pub(crate) fn finish(mut self, state: OperationState) -> Self {
        debug_assert!(state.is_settled());
        self.state = state;
        self
    }
}
