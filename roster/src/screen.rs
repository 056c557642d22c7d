use std::sync::Arc;

use tracing::{info, warn};
use warroom_core::{
    signals::Read, Dispatched, EngineConfig, Gateway, OptimisticCollection, PolicyAgent, Record, RecordId, Scope,
};

use crate::error::RosterError;

/// One gateway-backed list on a screen: an optimistic collection whose remote calls go
/// through `gateway`.
pub struct List<T: Record> {
    engine: OptimisticCollection<T>,
    gateway: Arc<dyn Gateway<T>>,
}

impl<T: Record> Clone for List<T> {
    fn clone(&self) -> Self { Self { engine: self.engine.clone(), gateway: self.gateway.clone() } }
}

impl<T: Record> List<T> {
    pub fn new(name: &'static str, gateway: Arc<dyn Gateway<T>>, config: EngineConfig) -> Self {
        Self { engine: OptimisticCollection::new(name, config), gateway }
    }

    pub fn engine(&self) -> &OptimisticCollection<T> { &self.engine }

    pub fn snapshot(&self) -> Vec<T> { self.engine.snapshot() }

    pub fn signal(&self) -> Read<Vec<T>> { self.engine.signal() }

    pub fn get(&self, id: &RecordId) -> Option<T> { self.engine.get(id) }

    /// The record under `id`, or `UnknownRecord` naming it as `kind`.
    pub fn require(&self, kind: &'static str, id: &RecordId) -> Result<T, RosterError> {
        self.engine.get(id).ok_or_else(|| RosterError::unknown(kind, id))
    }

    /// Fetch `scope` and replace the list with it.
    pub async fn load(&self, scope: &Scope) -> Result<usize, RosterError> { self.load_where(scope, |_| true).await }

    /// Fetch `scope`, keep the rows `keep` accepts, and replace the list with them.
    pub async fn load_where(&self, scope: &Scope, keep: impl Fn(&T) -> bool) -> Result<usize, RosterError> {
        let rows: Vec<T> = self.gateway.list(scope).await.into_result()?.into_iter().filter(|row| keep(row)).collect();
        let count = rows.len();
        self.engine.replace_all(rows)?;
        info!(list = self.engine.name(), count, "loaded");
        Ok(count)
    }

    pub fn create(&self, draft: T) -> Dispatched<T> {
        let gateway = self.gateway.clone();
        let payload = draft.clone();
        self.engine.insert(draft, move || async move { gateway.create(payload).await.into_result() })
    }

    pub fn save(&self, id: &RecordId, mutator: impl FnOnce(&T) -> T) -> Dispatched<T> {
        let gateway = self.gateway.clone();
        self.engine.update_with(id, mutator, move |next| async move { gateway.update(next).await.into_result() })
    }

    /// Show `record`, which already exists remotely but not in this list, and persist it with
    /// an update. It leaves the list again if the update fails.
    pub fn adopt(&self, record: T) -> Dispatched<T> {
        let gateway = self.gateway.clone();
        let payload = record.clone();
        self.engine.insert(record, move || async move { gateway.update(payload).await.into_result() })
    }

    pub fn delete(&self, id: &RecordId) -> Dispatched<T> {
        let gateway = self.gateway.clone();
        let target = id.clone();
        self.engine.remove(id, move || async move { gateway.delete(target).await.into_result() })
    }
}

/// Wait for every dispatch of one step to settle. Returns the confirmed records, or the first
/// failure once all of them have settled.
pub(crate) async fn settle_all<T: Record>(step: &'static str, dispatched: Vec<Dispatched<T>>) -> Result<Vec<T>, RosterError> {
    let mut records = Vec::with_capacity(dispatched.len());
    let mut first_failure = None;
    for dispatched in dispatched {
        let settlement = dispatched.settled().await;
        match settlement.failure() {
            Some(failure) => {
                warn!(step, %failure, "step failed");
                first_failure.get_or_insert_with(|| failure.clone());
            }
            None => records.extend(settlement.record().cloned()),
        }
    }
    match first_failure {
        Some(failure) => Err(RosterError::StepFailed { step, failure }),
        None => Ok(records),
    }
}

/// Shared by every screen: the policy consulted before any speculative change.
pub(crate) type Policy = Arc<dyn PolicyAgent>;
