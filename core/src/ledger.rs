//! Per-id bookkeeping for in-flight mutations.
//!
//! Each id with at least one operation in flight has an entry holding the speculative value
//! every pending operation put on screen, the last value the server confirmed, and the
//! slot the record occupied. Settlements consult the entry to decide what the list
//! should show, so a stale confirmation never overwrites a newer speculative edit.

use std::collections::{BTreeMap, HashMap};

use crate::{
    collection::Slot,
    id::RecordId,
    operation::{OperationKind, PendingOperation, Seq},
};

/// What the list should show for an id after a settlement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution<T> {
    /// A newer operation on this id is still in flight; leave the list alone.
    Leave,
    /// Show `value` (or nothing) under the id, restoring at `slot` if it is missing.
    Show { value: Option<T>, slot: Slot },
}

#[derive(Debug)]
struct Entry<T> {
    latest_issued: Seq,
    /// speculative value per in-flight operation; `None` means "removed"
    in_flight: BTreeMap<Seq, Option<T>>,
    confirmed: Option<T>,
    confirmed_seq: Option<Seq>,
    slot: Slot,
}

#[derive(Debug)]
pub(crate) struct Ledger<T> {
    next_seq: u64,
    entries: HashMap<RecordId, Entry<T>>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self { Self { next_seq: 1, entries: HashMap::new() } }
}

/// Result of settling one operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decision<T> {
    pub resolution: Resolution<T>,
    /// a newer operation on the same id was issued after this one
    pub newer_issued: bool,
    /// this operation's authoritative value became the confirmed value
    pub adopted: bool,
}

/// Outcome of a remote call as the ledger sees it.
pub(crate) enum Outcome<T> {
    /// Authoritative value; `None` for a confirmed removal
    Confirmed(Option<T>),
    Failed,
}

impl<T: Clone> Ledger<T> {
    /// Register a dispatched operation.
    ///
    /// `before` is what the list showed for `target` prior to this dispatch and becomes the
    /// confirmed baseline when no other operation on `target` is in flight. `slot` is
    /// where the record sat (or, for inserts, where it was appended).
    pub fn begin(
        &mut self,
        kind: OperationKind,
        target: &RecordId,
        before: Option<T>,
        slot: Slot,
        speculative: Option<T>,
    ) -> PendingOperation {
        let seq = Seq(self.next_seq);
        self.next_seq += 1;

        let entry = self.entries.entry(target.clone()).or_insert_with(|| Entry {
            latest_issued: seq,
            in_flight: BTreeMap::new(),
            confirmed: before,
            confirmed_seq: None,
            slot: slot.clone(),
        });
        entry.latest_issued = seq;
        entry.slot = slot;
        entry.in_flight.insert(seq, speculative);

        PendingOperation::new(kind, target.clone(), seq)
    }

    /// Record the outcome of `op` and decide what the list should show for its id.
    pub fn settle(&mut self, op: &PendingOperation, outcome: Outcome<T>) -> Decision<T> {
        let Some(entry) = self.entries.get_mut(&op.target) else {
            return Decision { resolution: Resolution::Leave, newer_issued: true, adopted: false };
        };
        entry.in_flight.remove(&op.seq);

        let mut adopted = false;
        if let Outcome::Confirmed(value) = outcome {
            if entry.confirmed_seq.map_or(true, |confirmed| op.seq > confirmed) {
                entry.confirmed = value;
                entry.confirmed_seq = Some(op.seq);
                adopted = true;
            }
        }

        let newer_issued = entry.latest_issued > op.seq;
        let resolution = if entry.in_flight.range(op.seq..).next().is_some() {
            Resolution::Leave
        } else {
            let visible = match entry.in_flight.iter().next_back() {
                Some((seq, speculative)) if entry.confirmed_seq.map_or(true, |confirmed| *seq > confirmed) => speculative.clone(),
                _ => entry.confirmed.clone(),
            };
            Resolution::Show { value: visible, slot: entry.slot.clone() }
        };

        if entry.in_flight.is_empty() {
            self.entries.remove(&op.target);
        }
        Decision { resolution, newer_issued, adopted }
    }

    pub fn in_flight(&self) -> usize { self.entries.values().map(|entry| entry.in_flight.len()).sum() }

    pub fn is_pending(&self, id: &RecordId) -> bool { self.entries.contains_key(id) }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
