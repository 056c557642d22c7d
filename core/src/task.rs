use std::future::Future;

use tracing::Instrument;

/// Spawn a settlement task on the ambient tokio runtime, inside the caller's span.
///
/// Panics when called outside a runtime, like `tokio::spawn`.
pub fn spawn<F>(future: F)
where F: Future<Output = ()> + Send + 'static {
    tokio::spawn(future.in_current_span());
}
