use std::sync::Arc;

use crate::{
    broadcast::{Broadcast, BroadcastId, ListenerGuard},
    signal::{Get, GetReadCell, Read, Signal, With},
    value::{ReadValueCell, ValueCell},
};

/// Writable half of an observable value. Views hold a [`Read`] instead.
pub struct Mut<T> {
    value: ValueCell<T>,
    broadcast: Broadcast,
}

impl<T> Clone for Mut<T> {
    fn clone(&self) -> Self { Self { value: self.value.clone(), broadcast: self.broadcast.clone() } }
}

impl<T: 'static> Mut<T> {
    pub fn new(value: T) -> Self { Self { value: ValueCell::new(value), broadcast: Broadcast::new() } }

    /// Replace the value and notify listeners.
    pub fn set(&self, value: T) {
        self.value.set(value);
        self.broadcast.send(());
    }

    /// Replace the value without notifying. Pair with [`Mut::notify`] when the write has to
    /// happen under a caller's lock but listeners must run outside it.
    pub fn set_quiet(&self, value: T) { self.value.set(value); }

    pub fn notify(&self) { self.broadcast.send(()); }

    /// Mutate in place and notify listeners.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = self.value.update(f);
        self.broadcast.send(());
        result
    }

    pub fn read(&self) -> Read<T> { Read { value: self.value.readvalue(), broadcast: self.broadcast.clone() } }
}

impl<T: Clone + 'static> Mut<T> {
    pub fn value(&self) -> T { self.value.value() }
}

impl<T> Signal for Mut<T> {
    fn listen(&self, listener: Arc<dyn Fn() + Send + Sync + 'static>) -> ListenerGuard { self.broadcast.reference().listen(listener) }
    fn broadcast_id(&self) -> BroadcastId { self.broadcast.id() }
}

impl<T: Clone + 'static> Get<T> for Mut<T> {
    fn get(&self) -> T { self.value.value() }
}

impl<T: 'static> With<T> for Mut<T> {
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { self.value.with(f) }
}

impl<T: 'static> GetReadCell<T> for Mut<T> {
    fn get_readcell(&self) -> ReadValueCell<T> { self.value.readvalue() }
}
