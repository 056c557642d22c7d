use crate::broadcast::ListenerGuard;

/// Boxed listener receiving the new value after each change.
pub type SubscribeListener<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

pub trait IntoSubscribeListener<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T>;
}

/// Subscribe to a signal, receiving a clone of each new value.
pub trait Subscribe<T: 'static> {
    fn subscribe<L>(&self, listener: L) -> SubscriptionGuard
    where L: IntoSubscribeListener<T>;
}

/// Keeps a subscription alive. Dropping it unsubscribes.
#[must_use = "dropping the guard unsubscribes the listener"]
pub struct SubscriptionGuard {
    _listenerguard: ListenerGuard,
}

impl SubscriptionGuard {
    pub fn new(guard: ListenerGuard) -> Self { Self { _listenerguard: guard } }
}

impl<F, T> IntoSubscribeListener<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_subscribe_listener(self) -> SubscribeListener<T> { Box::new(self) }
}

impl<T: Send + 'static> IntoSubscribeListener<T> for std::sync::mpsc::Sender<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T> {
        let sender = std::sync::Mutex::new(self);
        Box::new(move |value| {
            let _ = sender.lock().expect("sender lock poisoned").send(value);
        })
    }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> IntoSubscribeListener<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T> {
        Box::new(move |value| {
            let _ = self.send(value);
        })
    }
}
