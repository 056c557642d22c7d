use std::{
    cmp::Ordering,
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::{Gateway, RemoteResponse, Scope};
use crate::{
    error::{RejectionKind, RemoteError},
    id::RecordId,
    record::Record,
};

type Validator<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// Number of requests a [`MemoryGateway`] has served, per kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

/// Lets a held request proceed. Dropping it releases too.
pub struct Release(oneshot::Sender<()>);

impl Release {
    pub fn release(self) { let _ = self.0.send(()); }
}

/// In-process table standing in for the real backend.
///
/// Issues server ids on create, stamps records via [`Record::touch`], and enforces unique
/// fields. Tests can script failures with [`MemoryGateway::fail_next`] and control the order
/// in which requests settle with [`MemoryGateway::hold_next`]. Scripted failures and holds
/// attach to requests in arrival order.
pub struct MemoryGateway<T> {
    table: &'static str,
    state: Mutex<State<T>>,
}

struct State<T> {
    rows: Vec<T>,
    unique: Vec<String>,
    validator: Option<Validator<T>>,
    latency: Option<Duration>,
    failures: VecDeque<RemoteError>,
    holds: VecDeque<oneshot::Receiver<()>>,
    calls: CallCounts,
}

impl<T: Record + Serialize> MemoryGateway<T> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            state: Mutex::new(State {
                rows: Vec::new(),
                unique: Vec::new(),
                validator: None,
                latency: None,
                failures: VecDeque::new(),
                holds: VecDeque::new(),
                calls: CallCounts::default(),
            }),
        }
    }

    pub fn with_rows(self, rows: impl IntoIterator<Item = T>) -> Self {
        self.lock().rows.extend(rows);
        self
    }

    /// Reject creates and updates that would duplicate `field` across rows.
    pub fn with_unique(self, field: impl Into<String>) -> Self {
        self.lock().unique.push(field.into());
        self
    }

    /// Server-side validation; an `Err(message)` becomes a validation rejection.
    pub fn with_validator(self, validator: impl Fn(&T) -> Result<(), String> + Send + Sync + 'static) -> Self {
        self.lock().validator = Some(Arc::new(validator));
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    /// The next request to arrive fails with `error`.
    pub fn fail_next(&self, error: RemoteError) { self.lock().failures.push_back(error); }

    /// The next request to arrive waits until the returned handle is released or dropped.
    pub fn hold_next(&self) -> Release {
        let (tx, rx) = oneshot::channel();
        self.lock().holds.push_back(rx);
        Release(tx)
    }

    pub fn rows(&self) -> Vec<T> { self.lock().rows.clone() }

    pub fn calls(&self) -> CallCounts { self.lock().calls }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> { self.state.lock().expect("memory gateway lock poisoned") }

    /// Claim this request's hold and scripted failure, then wait out the hold and latency.
    async fn admit(&self, count: impl FnOnce(&mut CallCounts)) -> Result<(), RemoteError> {
        let (hold, failure, latency) = {
            let mut state = self.lock();
            count(&mut state.calls);
            (state.holds.pop_front(), state.failures.pop_front(), state.latency)
        };
        if let Some(hold) = hold {
            trace!(table = self.table, "request held");
            let _ = hold.await;
        }
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => {
                debug!(table = self.table, %error, "scripted failure");
                Err(error)
            }
            None => Ok(()),
        }
    }
}

impl<T> State<T>
where T: Record + Serialize
{
    fn check(&self, table: &str, record: &T) -> Result<(), RemoteError> {
        if let Some(validator) = &self.validator {
            validator(record).map_err(|message| RemoteError::rejected(RejectionKind::Validation, message))?;
        }
        if self.unique.is_empty() {
            return Ok(());
        }
        let candidate = encode(record)?;
        for other in self.rows.iter().filter(|row| row.id() != record.id()) {
            let other = encode(other)?;
            for field in &self.unique {
                match (field_text(&candidate, field), field_text(&other, field)) {
                    (Some(a), Some(b)) if a == b => {
                        return Err(RemoteError::rejected(RejectionKind::Conflict, format!("{table}.{field} {a:?} already exists")));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn encode<T: Serialize>(record: &T) -> Result<serde_json::Value, RemoteError> {
    serde_json::to_value(record).map_err(|e| RemoteError::transport(format!("encode failed: {e}")))
}

fn field_text(value: &serde_json::Value, field: &str) -> Option<String> {
    match value.get(field)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Order two field values the way a database would: numbers numerically, strings
/// lexically, nulls and missing fields first. Mixed types compare by their text.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => a.to_string().cmp(&b.to_string()),
        },
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn matches(value: &serde_json::Value, scope: &Scope) -> bool {
    scope.filters.iter().all(|(field, expected)| field_text(value, field).as_deref() == Some(expected.as_str()))
}

#[async_trait]
impl<T> Gateway<T> for MemoryGateway<T>
where T: Record + Serialize
{
    async fn list(&self, scope: &Scope) -> RemoteResponse<Vec<T>> {
        if let Err(error) = self.admit(|calls| calls.list += 1).await {
            return RemoteResponse::err(error);
        }
        let state = self.lock();
        let mut rows = Vec::new();
        for row in &state.rows {
            match encode(row) {
                Ok(value) if matches(&value, scope) => rows.push((value, row.clone())),
                Ok(_) => {}
                Err(error) => return RemoteResponse::err(error),
            }
        }
        if let Some(field) = &scope.order_by {
            rows.sort_by(|(a, _), (b, _)| compare(a.get(field), b.get(field)));
            if scope.descending {
                rows.reverse();
            }
        }
        RemoteResponse::ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn create(&self, draft: T) -> RemoteResponse<T> {
        if let Err(error) = self.admit(|calls| calls.create += 1).await {
            return RemoteResponse::err(error);
        }
        let mut record = if draft.id().as_str().is_empty() || draft.id().is_provisional() { draft.with_id(RecordId::issued()) } else { draft };

        let mut state = self.lock();
        if state.rows.iter().any(|row| row.id() == record.id()) {
            return RemoteResponse::err(RemoteError::rejected(RejectionKind::Conflict, format!("{}.id {} already exists", self.table, record.id())));
        }
        if let Err(error) = state.check(self.table, &record) {
            return RemoteResponse::err(error);
        }
        record.touch(Utc::now());
        state.rows.push(record.clone());
        debug!(table = self.table, id = %record.id(), "created");
        RemoteResponse::ok(record)
    }

    async fn update(&self, record: T) -> RemoteResponse<T> {
        if let Err(error) = self.admit(|calls| calls.update += 1).await {
            return RemoteResponse::err(error);
        }
        let mut record = record;
        let mut state = self.lock();
        let Some(index) = state.rows.iter().position(|row| row.id() == record.id()) else {
            return RemoteResponse::err(RemoteError::rejected(RejectionKind::NotFound, format!("{} {} does not exist", self.table, record.id())));
        };
        if let Err(error) = state.check(self.table, &record) {
            return RemoteResponse::err(error);
        }
        record.touch(Utc::now());
        state.rows[index] = record.clone();
        RemoteResponse::ok(record)
    }

    async fn delete(&self, id: RecordId) -> RemoteResponse<()> {
        if let Err(error) = self.admit(|calls| calls.delete += 1).await {
            return RemoteResponse::err(error);
        }
        let mut state = self.lock();
        match state.rows.iter().position(|row| row.id() == &id) {
            Some(index) => {
                state.rows.remove(index);
                RemoteResponse::ok(())
            }
            None => RemoteResponse::err(RemoteError::rejected(RejectionKind::NotFound, format!("{} {id} does not exist", self.table))),
        }
    }
}
