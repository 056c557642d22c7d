use std::sync::Arc;

use crate::{
    broadcast::{Broadcast, BroadcastId, ListenerGuard},
    porcelain::{IntoSubscribeListener, Subscribe, SubscriptionGuard},
    signal::{Get, GetReadCell, Signal, With},
    value::ReadValueCell,
};

/// Read-only half of a [`crate::Mut`].
pub struct Read<T> {
    pub(crate) value: ReadValueCell<T>,
    pub(crate) broadcast: Broadcast,
}

impl<T> Clone for Read<T> {
    fn clone(&self) -> Self { Self { value: self.value.clone(), broadcast: self.broadcast.clone() } }
}

impl<T> Signal for Read<T> {
    fn listen(&self, listener: Arc<dyn Fn() + Send + Sync + 'static>) -> ListenerGuard { self.broadcast.reference().listen(listener) }
    fn broadcast_id(&self) -> BroadcastId { self.broadcast.id() }
}

impl<T: Clone + 'static> Get<T> for Read<T> {
    fn get(&self) -> T { self.value.value() }
}

impl<T: 'static> With<T> for Read<T> {
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { self.value.with(f) }
}

impl<T: 'static> GetReadCell<T> for Read<T> {
    fn get_readcell(&self) -> ReadValueCell<T> { self.value.clone() }
}

impl<T: Clone + Send + Sync + 'static> Subscribe<T> for Read<T> {
    fn subscribe<L>(&self, listener: L) -> SubscriptionGuard
    where L: IntoSubscribeListener<T> {
        let listener = listener.into_subscribe_listener();
        let value = self.value.clone();
        let guard = self.broadcast.reference().listen(Arc::new(move || listener(value.value())) as Arc<dyn Fn() + Send + Sync>);
        SubscriptionGuard::new(guard)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Read<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.value.with(|v| f.debug_tuple("Read").field(v).finish()) }
}
