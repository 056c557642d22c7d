pub mod mutable;
pub mod read;

pub use mutable::*;
pub use read::*;

use crate::broadcast::{BroadcastId, ListenerGuard};
use std::sync::Arc;

/// Anything that can tell listeners it changed.
pub trait Signal {
    fn listen(&self, listener: Arc<dyn Fn() + Send + Sync + 'static>) -> ListenerGuard;
    fn broadcast_id(&self) -> BroadcastId;
}

/// Clone of the current value.
pub trait Get<T: 'static>: Signal {
    fn get(&self) -> T;
}

/// Borrow the current value for the duration of a closure.
pub trait With<T: 'static> {
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R;
}

/// Read-only cell sharing the present value.
pub trait GetReadCell<T: 'static> {
    fn get_readcell(&self) -> crate::value::ReadValueCell<T>;
}
