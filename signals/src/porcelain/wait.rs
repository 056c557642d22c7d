use std::sync::Arc;

use crate::signal::{GetReadCell, Signal};

/// Lets `wait_for` predicates either return `bool` or `Option<R>`.
///
/// `Some(output)` stops waiting; `None` keeps waiting for the next change.
pub trait WaitResult {
    type Output;
    fn result(self) -> Option<Self::Output>;
}

impl WaitResult for bool {
    type Output = ();
    fn result(self) -> Option<Self::Output> { if self { Some(()) } else { None } }
}

impl<T> WaitResult for Option<T> {
    type Output = T;
    fn result(self) -> Option<Self::Output> { self }
}

/// Await a signal reaching some state.
pub trait Wait<T: 'static> {
    fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = R::Output> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult + Send,
        R::Output: Send;
}

impl<T, S> Wait<T> for S
where
    S: Signal + GetReadCell<T> + Sync,
    T: Send + Sync + 'static,
{
    fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = R::Output> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult + Send,
        R::Output: Send,
    {
        async move {
            let cell = self.get_readcell();
            if let Some(result) = cell.with(|value| predicate(value).result()) {
                return result;
            }

            // bridge the synchronous broadcast into the async world
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
            let _guard = self.listen(Arc::new(move || {
                let _ = tx.send(());
            }));

            loop {
                // the sender lives in our own guard, so the channel cannot close first
                let _ = rx.recv().await;
                if let Some(result) = cell.with(|value| predicate(value).result()) {
                    return result;
                }
            }
        }
    }
}
