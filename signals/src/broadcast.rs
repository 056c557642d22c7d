use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Identifies a broadcast for deduplication. Only a Broadcast can mint one.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BroadcastId(usize);

impl std::fmt::Display for BroadcastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// A registered listener.
#[derive(Clone)]
pub enum BroadcastListener<T = ()> {
    /// Receives the sent value
    Payload(Arc<dyn Fn(T) + Send + Sync + 'static>),
    /// Only learns that something was sent
    NotifyOnly(Arc<dyn Fn() + Send + Sync + 'static>),
}

/// Conversion into a [`BroadcastListener`].
pub trait IntoBroadcastListener<T> {
    fn into_broadcast_listener(self) -> BroadcastListener<T>;
}

/// Synchronous fan-out of values to every live listener.
///
/// Listeners are invoked on the sending thread, after the listener table lock has been
/// released, so a listener may subscribe or drop guards while being called.
pub struct Broadcast<T = ()>(Arc<Inner<T>>);

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

struct Inner<T> {
    listeners: RwLock<BTreeMap<usize, BroadcastListener<T>>>,
    next_id: AtomicUsize,
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast").field("listeners", &self.listener_count()).finish()
    }
}

/// Listen-only handle to a broadcast.
pub struct Ref<'a, T>(&'a Broadcast<T>);

/// Unsubscribes its listener when dropped. Does not keep the broadcast alive.
#[must_use = "dropping the guard unsubscribes the listener"]
pub struct ListenerGuard<T = ()> {
    inner: Weak<Inner<T>>,
    id: usize,
}

impl<T> ListenerGuard<T> {
    pub fn broadcast_id(&self) -> BroadcastId { BroadcastId(self.inner.as_ptr() as *const () as usize) }
}

impl<T> Drop for ListenerGuard<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.write().expect("broadcast lock poisoned").remove(&self.id);
        }
    }
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Broadcast<T> {
    pub fn id(&self) -> BroadcastId { BroadcastId(Arc::as_ptr(&self.0) as *const () as usize) }

    pub fn listener_count(&self) -> usize { self.0.listeners.read().expect("broadcast lock poisoned").len() }

    /// Listen-only view, so holders cannot send.
    pub fn reference(&self) -> Ref<'_, T> { Ref(self) }
}

impl<T: Clone> Broadcast<T> {
    pub fn new() -> Self { Self(Arc::new(Inner { listeners: RwLock::new(BTreeMap::new()), next_id: AtomicUsize::new(0) })) }

    /// Deliver `value` to every listener in subscription order. Returns how many were called.
    pub fn send(&self, value: T) -> usize {
        let listeners: Vec<BroadcastListener<T>> =
            self.0.listeners.read().expect("broadcast lock poisoned").values().cloned().collect();

        let count = listeners.len();
        if let Some((last, rest)) = listeners.split_last() {
            for listener in rest {
                listener.call(value.clone());
            }
            last.call(value);
        }
        count
    }
}

impl<T> BroadcastListener<T> {
    fn call(&self, value: T) {
        match self {
            BroadcastListener::Payload(f) => f(value),
            BroadcastListener::NotifyOnly(f) => f(),
        }
    }
}

impl<'a, T> Ref<'a, T> {
    pub fn listen<L>(&self, listener: L) -> ListenerGuard<T>
    where L: IntoBroadcastListener<T> {
        let inner = &(self.0).0;
        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        inner.listeners.write().expect("broadcast lock poisoned").insert(id, listener.into_broadcast_listener());
        ListenerGuard { inner: Arc::downgrade(inner), id }
    }

    pub fn broadcast_id(&self) -> BroadcastId { self.0.id() }
}

impl<F, T> IntoBroadcastListener<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_broadcast_listener(self) -> BroadcastListener<T> { BroadcastListener::Payload(Arc::new(self)) }
}

impl<T> IntoBroadcastListener<T> for BroadcastListener<T> {
    fn into_broadcast_listener(self) -> BroadcastListener<T> { self }
}

impl<T> IntoBroadcastListener<T> for Arc<dyn Fn() + Send + Sync + 'static> {
    fn into_broadcast_listener(self) -> BroadcastListener<T> { BroadcastListener::NotifyOnly(self) }
}

#[cfg(feature = "tokio")]
impl<T> IntoBroadcastListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: Send + 'static
{
    fn into_broadcast_listener(self) -> BroadcastListener<T> {
        BroadcastListener::Payload(Arc::new(move |value| {
            // receiver gone means nobody is watching anymore
            let _ = self.send(value);
        }))
    }
}

impl<T> IntoBroadcastListener<T> for std::sync::mpsc::Sender<T>
where T: Send + 'static
{
    fn into_broadcast_listener(self) -> BroadcastListener<T> {
        let sender = std::sync::Mutex::new(self);
        BroadcastListener::Payload(Arc::new(move |value| {
            let _ = sender.lock().expect("sender lock poisoned").send(value);
        }))
    }
}
