use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::Level;
use warroom_core::{EngineConfig, OperationFailed, OptimisticCollection, Record, RecordId, RemoteError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    pub name: String,
}

impl Record for Note {
    fn id(&self) -> &RecordId { &self.id }
    fn with_id(self, id: RecordId) -> Self { Self { id, ..self } }
}

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

#[allow(unused)]
pub fn note(id: &str, name: &str) -> Note { Note { id: id.into(), name: name.into() } }

#[allow(unused)]
pub fn notes(items: &[(&str, &str)]) -> OptimisticCollection<Note> {
    OptimisticCollection::with_items("notes", items.iter().map(|(id, name)| note(id, name)).collect(), EngineConfig::default())
        .expect("fixture ids are unique")
}

#[allow(unused)]
pub fn ids(items: &[Note]) -> Vec<&str> { items.iter().map(|n| n.id.as_str()).collect() }

#[allow(unused)]
pub type RemoteFuture<T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send>>;

/// A remote call that settles only when the test says so.
#[allow(unused)]
pub struct Gate<T> {
    tx: oneshot::Sender<Result<T, RemoteError>>,
}

#[allow(unused)]
impl<T: Send + 'static> Gate<T> {
    /// The gate, plus a thunk suitable for the engine's `remote` argument.
    pub fn new() -> (Self, impl FnOnce() -> RemoteFuture<T> + Send + 'static) {
        let (tx, rx) = oneshot::channel();
        let thunk = move || -> RemoteFuture<T> { Box::pin(async move { rx.await.unwrap_or_else(|_| Err(RemoteError::transport("gate dropped"))) }) };
        (Self { tx }, thunk)
    }

    pub fn succeed(self, value: T) { let _ = self.tx.send(Ok(value)); }

    pub fn fail(self, error: RemoteError) { let _ = self.tx.send(Err(error)); }
}

/// Collects every failure notice an engine broadcasts.
#[allow(unused)]
#[derive(Clone, Default)]
pub struct FailureLog(Arc<Mutex<Vec<OperationFailed>>>);

#[allow(unused)]
impl FailureLog {
    pub fn listener(&self) -> impl Fn(OperationFailed) + Send + Sync + 'static {
        let log = self.0.clone();
        move |failure| log.lock().unwrap().push(failure)
    }

    pub fn take(&self) -> Vec<OperationFailed> { self.0.lock().unwrap().drain(..).collect() }
}
