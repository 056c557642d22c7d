//! The optimistic mutation engine.
//!
//! [`OptimisticCollection`] applies every mutation to its local list immediately, hands the
//! updated snapshot back to the caller, and runs the remote call on a spawned task. When the
//! call settles, the ledger decides what the list should show for the affected id: the
//! server's version, the pre-mutation value, or nothing at all when a newer operation on the
//! same id still owns the screen.
//!
//! ```rust,no_run
//! # use warroom_core::{engine::OptimisticCollection, config::EngineConfig, record::Record, id::RecordId};
//! # #[derive(Clone)] struct Note { id: RecordId, text: String }
//! # impl Record for Note {
//! #     fn id(&self) -> &RecordId { &self.id }
//! #     fn with_id(self, id: RecordId) -> Self { Self { id, ..self } }
//! # }
//! # async fn demo() {
//! let notes = OptimisticCollection::new("notes", EngineConfig::default());
//! let draft = Note { id: notes.provisional_id(), text: "hello".into() };
//! let dispatched = notes.insert(draft.clone(), move || async move { Ok(draft.with_id("n1".into())) });
//! assert_eq!(dispatched.snapshot().len(), 1);
//! dispatched.settled().await;
//! # }
//! ```

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, RwLock},
};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use warroom_signals::{broadcast::Ref, Broadcast, Mut, Read};

use crate::{
    collection::{Collection, Slot},
    config::EngineConfig,
    error::{CollectionError, OperationFailed, RemoteError},
    id::RecordId,
    ledger::{Ledger, Outcome, Resolution},
    operation::{OperationKind, OperationState, PendingOperation},
    record::Record,
    task,
};

type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// How a dispatched operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<T> {
    /// The server's version is on screen. `None` for a confirmed removal.
    Reconciled(Option<T>),
    /// The call succeeded but a newer operation on the same id decides what is shown.
    Superseded(Option<T>),
    /// The call failed and the speculative change was reverted.
    RolledBack(OperationFailed),
    /// The call failed and the list was left alone, either because a newer operation on the
    /// id is still in flight or because rollback is disabled.
    Failed(OperationFailed),
    /// The dispatch was a no-op; no remote call was made.
    Skipped,
}

impl<T> Settlement<T> {
    pub fn is_success(&self) -> bool { matches!(self, Settlement::Reconciled(_) | Settlement::Superseded(_)) }

    pub fn failure(&self) -> Option<&OperationFailed> {
        match self {
            Settlement::RolledBack(failure) | Settlement::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Settlement::Reconciled(record) | Settlement::Superseded(record) => record.as_ref(),
            _ => None,
        }
    }
}

/// Returned synchronously by every dispatch.
#[derive(Debug)]
pub struct Dispatched<T> {
    kind: OperationKind,
    target: RecordId,
    snapshot: Vec<T>,
    settled: Option<oneshot::Receiver<Settlement<T>>>,
}

impl<T> Dispatched<T> {
    fn skipped(kind: OperationKind, target: RecordId, snapshot: Vec<T>) -> Self { Self { kind, target, snapshot, settled: None } }

    pub fn kind(&self) -> OperationKind { self.kind }

    pub fn target(&self) -> &RecordId { &self.target }

    /// The list as it stood right after the local step.
    pub fn snapshot(&self) -> &[T] { &self.snapshot }

    pub fn into_snapshot(self) -> Vec<T> { self.snapshot }

    pub fn is_noop(&self) -> bool { self.settled.is_none() }

    /// Wait for the remote call to settle and the list to be reconciled or rolled back.
    pub async fn settled(self) -> Settlement<T> {
        match self.settled {
            None => Settlement::Skipped,
            Some(rx) => rx.await.unwrap_or_else(|_| {
                Settlement::Failed(OperationFailed::new(self.kind, self.target, RemoteError::transport("operation task ended before settling")))
            }),
        }
    }
}

/// An ordered list of records kept in step with a remote gateway, optimistically.
///
/// Cheap to clone; clones share the same list.
pub struct OptimisticCollection<T: Record> {
    inner: Arc<Inner<T>>,
}

impl<T: Record> Clone for OptimisticCollection<T> {
    fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

struct Inner<T: Record> {
    name: &'static str,
    config: EngineConfig,
    state: Mutex<State<T>>,
    snapshot: Mut<Vec<T>>,
    published: Mutex<u64>,
    failures: Broadcast<OperationFailed>,
    on_success: RwLock<Option<SuccessHook<T>>>,
}

struct State<T> {
    collection: Collection<T>,
    ledger: Ledger<T>,
    last_failure: Option<OperationFailed>,
    version: u64,
}

impl<T: Record> State<T> {
    fn bump(&mut self) -> (u64, Vec<T>) {
        self.version += 1;
        (self.version, self.collection.to_vec())
    }

    /// Make the list show `value` for `key`. The value may carry a new id (an insert being
    /// reconciled); a stale row already holding that id is dropped.
    fn show(&mut self, name: &str, key: &RecordId, value: Option<T>, slot: &Slot) {
        match value {
            Some(item) => {
                let id = item.id().clone();
                if &id != key && self.collection.contains(key) && self.collection.contains(&id) {
                    warn!(collection = name, %id, "dropping duplicate row during reconciliation");
                    self.collection.remove(&id);
                }
                let result = if self.collection.contains(key) {
                    self.collection.replace(key, item).map(|_| ())
                } else if self.collection.contains(&id) {
                    self.collection.replace(&id, item).map(|_| ())
                } else {
                    self.collection.insert_at_slot(slot, item).map(|_| ())
                };
                if let Err(e) = result {
                    warn!(collection = name, %key, "could not restore row: {e}");
                }
            }
            None => {
                self.collection.remove(key);
            }
        }
    }
}

impl<T: Record> OptimisticCollection<T> {
    /// An empty collection. `name` labels log lines.
    pub fn new(name: &'static str, config: EngineConfig) -> Self { Self::build(name, Collection::new(), config) }

    /// Fails if `items` contains duplicate ids.
    pub fn with_items(name: &'static str, items: Vec<T>, config: EngineConfig) -> Result<Self, CollectionError> {
        Ok(Self::build(name, Collection::from_items(items)?, config))
    }

    fn build(name: &'static str, collection: Collection<T>, config: EngineConfig) -> Self {
        let snapshot = Mut::new(collection.to_vec());
        Self {
            inner: Arc::new(Inner {
                name,
                config,
                state: Mutex::new(State { collection, ledger: Ledger::default(), last_failure: None, version: 0 }),
                snapshot,
                published: Mutex::new(0),
                failures: Broadcast::new(),
                on_success: RwLock::new(None),
            }),
        }
    }

    pub fn name(&self) -> &'static str { self.inner.name }

    pub fn config(&self) -> &EngineConfig { &self.inner.config }

    /// A fresh client-side id using the configured prefix.
    pub fn provisional_id(&self) -> RecordId { RecordId::provisional_with_prefix(&self.inner.config.provisional_prefix) }

    pub fn is_provisional(&self, id: &RecordId) -> bool { id.has_prefix(&self.inner.config.provisional_prefix) }

    pub fn snapshot(&self) -> Vec<T> { self.lock().collection.to_vec() }

    pub fn get(&self, id: &RecordId) -> Option<T> { self.lock().collection.get(id).cloned() }

    pub fn len(&self) -> usize { self.lock().collection.len() }

    pub fn is_empty(&self) -> bool { self.lock().collection.is_empty() }

    /// Observable snapshot for views.
    pub fn signal(&self) -> Read<Vec<T>> { self.inner.snapshot.read() }

    /// Every failed remote call is announced here, rolled back or not.
    pub fn failures(&self) -> Ref<'_, OperationFailed> { self.inner.failures.reference() }

    pub fn pending_count(&self) -> usize { self.lock().ledger.in_flight() }

    pub fn is_pending(&self) -> bool { !self.lock().ledger.is_empty() }

    pub fn is_pending_id(&self, id: &RecordId) -> bool { self.lock().ledger.is_pending(id) }

    /// Most recent failure, cleared by the next dispatch.
    pub fn last_failure(&self) -> Option<OperationFailed> { self.lock().last_failure.clone() }

    /// Called with every record the server confirms.
    pub fn on_success(&self, hook: impl Fn(&T) + Send + Sync + 'static) {
        *self.inner.on_success.write().expect("success hook lock poisoned") = Some(Arc::new(hook));
    }

    /// Swap in a freshly loaded list. Refused while any operation is in flight.
    pub fn replace_all(&self, items: Vec<T>) -> Result<(), CollectionError> {
        let (version, snapshot) = {
            let mut state = self.lock();
            let in_flight = state.ledger.in_flight();
            if in_flight > 0 {
                return Err(CollectionError::Busy(in_flight));
            }
            state.collection = Collection::from_items(items)?;
            state.bump()
        };
        info!(collection = self.inner.name, rows = snapshot.len(), "replaced contents");
        self.publish(version, snapshot);
        Ok(())
    }

    /// Append `provisional` now; swap it for the server's version when `remote` succeeds, or
    /// take it back out when it fails.
    pub fn insert<F, Fut>(&self, provisional: T, remote: F) -> Dispatched<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let kind = OperationKind::Insert;
        let target = provisional.id().clone();
        let (op, version, snapshot) = {
            let mut state = self.lock();
            let slot = state.collection.next_slot();
            if let Err(e) = state.collection.push(provisional.clone()) {
                warn!(collection = self.inner.name, %target, "insert skipped: {e}");
                return Dispatched::skipped(kind, target, state.collection.to_vec());
            }
            let op = state.ledger.begin(kind, &target, None, slot, Some(provisional));
            state.last_failure = None;
            let (version, snapshot) = state.bump();
            (op, version, snapshot)
        };
        debug!(collection = self.inner.name, %target, seq = %op.seq, "insert dispatched");
        self.publish(version, snapshot.clone());

        let settled = self.spawn_settle(op, async move { remote().await.map(Some) });
        Dispatched { kind, target, snapshot, settled: Some(settled) }
    }

    /// Take the record out now; put it back where it was if `remote` fails.
    pub fn remove<F, Fut>(&self, target: &RecordId, remote: F) -> Dispatched<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), RemoteError>> + Send + 'static,
    {
        let kind = OperationKind::Remove;
        let (op, version, snapshot) = {
            let mut state = self.lock();
            let (Some(slot), Some((_, before))) = (state.collection.slot_of(target), state.collection.remove(target)) else {
                debug!(collection = self.inner.name, %target, "remove of absent id ignored");
                return Dispatched::skipped(kind, target.clone(), state.collection.to_vec());
            };
            let op = state.ledger.begin(kind, target, Some(before), slot, None);
            state.last_failure = None;
            let (version, snapshot) = state.bump();
            (op, version, snapshot)
        };
        debug!(collection = self.inner.name, %target, seq = %op.seq, "remove dispatched");
        self.publish(version, snapshot.clone());

        let settled = self.spawn_settle(op, async move { remote().await.map(|()| None) });
        Dispatched { kind, target: target.clone(), snapshot, settled: Some(settled) }
    }

    /// Show `mutator(&current)` now; adopt the server's version on success, restore the
    /// previous value on failure.
    pub fn update<M, F, Fut>(&self, target: &RecordId, mutator: M, remote: F) -> Dispatched<T>
    where
        M: FnOnce(&T) -> T,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        self.update_with(target, mutator, move |_| remote())
    }

    /// Like [`update`](Self::update), but the remote call receives the mutated record.
    pub fn update_with<M, F, Fut>(&self, target: &RecordId, mutator: M, remote: F) -> Dispatched<T>
    where
        M: FnOnce(&T) -> T,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let kind = OperationKind::Update;
        let (op, next, version, snapshot) = {
            let mut state = self.lock();
            let (Some(slot), Some(before)) = (state.collection.slot_of(target), state.collection.get(target).cloned()) else {
                debug!(collection = self.inner.name, %target, "update of absent id ignored");
                return Dispatched::skipped(kind, target.clone(), state.collection.to_vec());
            };
            let mut next = mutator(&before);
            if next.id() != target {
                warn!(collection = self.inner.name, %target, changed_to = %next.id(), "mutator changed the id; restoring it");
                next = next.with_id(target.clone());
            }
            if let Err(e) = state.collection.replace(target, next.clone()) {
                warn!(collection = self.inner.name, %target, "update skipped: {e}");
                return Dispatched::skipped(kind, target.clone(), state.collection.to_vec());
            }
            let op = state.ledger.begin(kind, target, Some(before), slot, Some(next.clone()));
            state.last_failure = None;
            let (version, snapshot) = state.bump();
            (op, next, version, snapshot)
        };
        debug!(collection = self.inner.name, %target, seq = %op.seq, "update dispatched");
        self.publish(version, snapshot.clone());

        let settled = self.spawn_settle(op, async move { remote(next).await.map(Some) });
        Dispatched { kind, target: target.clone(), snapshot, settled: Some(settled) }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> { self.inner.state.lock().expect("collection state lock poisoned") }

    /// Publish a snapshot taken at `version`, unless a newer one was already published.
    /// Listeners run after every engine lock is released, so they may dispatch.
    fn publish(&self, version: u64, snapshot: Vec<T>) {
        let accepted = {
            let mut published = self.inner.published.lock().expect("publish lock poisoned");
            if version > *published {
                *published = version;
                self.inner.snapshot.set_quiet(snapshot);
                true
            } else {
                false
            }
        };
        if accepted {
            self.inner.snapshot.notify();
        }
    }

    fn spawn_settle<Fut>(&self, op: PendingOperation, call: Fut) -> oneshot::Receiver<Settlement<T>>
    where Fut: Future<Output = Result<Option<T>, RemoteError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let engine = self.clone();
        let limit = self.inner.config.remote_timeout;
        task::spawn(async move {
            let result = match limit {
                Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or(Err(RemoteError::Timeout(limit))),
                None => call.await,
            };
            // the caller may have dropped its handle
            let _ = tx.send(engine.settle(op, result));
        });
        rx
    }

    fn settle(&self, op: PendingOperation, result: Result<Option<T>, RemoteError>) -> Settlement<T> {
        let name = self.inner.name;
        let (settlement, op_state, published) = {
            let mut state = self.lock();
            let outcome = match &result {
                Ok(value) => Outcome::Confirmed(value.clone()),
                Err(_) => Outcome::Failed,
            };
            let decision = state.ledger.settle(&op, outcome);
            let apply = result.is_ok() || self.inner.config.rollback_on_error;

            let shown = match decision.resolution {
                Resolution::Show { value, slot } if apply => {
                    state.show(name, &op.target, value, &slot);
                    true
                }
                _ => false,
            };

            let (settlement, op_state) = match result {
                Ok(record) if shown && decision.adopted => (Settlement::Reconciled(record), OperationState::Reconciled),
                Ok(record) => (Settlement::Superseded(record), OperationState::Superseded),
                Err(reason) => {
                    let failure = OperationFailed::new(op.kind, op.target.clone(), reason);
                    state.last_failure = Some(failure.clone());
                    if shown {
                        (Settlement::RolledBack(failure), OperationState::RolledBack)
                    } else if apply {
                        (Settlement::Failed(failure), OperationState::Superseded)
                    } else {
                        (Settlement::Failed(failure), OperationState::Failed)
                    }
                }
            };
            let published = shown.then(|| state.bump());
            (settlement, op_state, published)
        };

        let op = op.finish(op_state);
        if let Some((version, snapshot)) = published {
            self.publish(version, snapshot);
        }
        match &settlement {
            Settlement::RolledBack(failure) => warn!(collection = name, target = %op.target, seq = %op.seq, "{failure}; rolled back"),
            Settlement::Failed(failure) => warn!(collection = name, target = %op.target, seq = %op.seq, state = ?op.state(), "{failure}"),
            _ => debug!(collection = name, target = %op.target, seq = %op.seq, state = ?op.state(), "{} settled", op.kind),
        }
        if let Some(failure) = settlement.failure() {
            self.inner.failures.send(failure.clone());
        }
        if let Some(record) = settlement.record() {
            let hook = self.inner.on_success.read().expect("success hook lock poisoned").clone();
            if let Some(hook) = hook {
                hook(record);
            }
        }
        settlement
    }
}

impl<T: Record + std::fmt::Debug> std::fmt::Debug for OptimisticCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("OptimisticCollection")
            .field("name", &self.inner.name)
            .field("items", &state.collection.as_slice())
            .field("in_flight", &state.ledger.in_flight())
            .finish()
    }
}
