use std::sync::{Arc, RwLock};

/// Shared storage behind a [`crate::Mut`] and all of its [`crate::Read`] halves.
pub struct ValueCell<T>(Arc<RwLock<T>>);

/// Read-only view of a [`ValueCell`].
pub struct ReadValueCell<T>(Arc<RwLock<T>>);

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for ReadValueCell<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> ValueCell<T> {
    pub fn new(value: T) -> Self { Self(Arc::new(RwLock::new(value))) }

    pub fn set(&self, value: T) { *self.0.write().expect("value lock poisoned") = value; }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&self.0.read().expect("value lock poisoned")) }

    /// Mutate in place, returning whatever the closure returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R { f(&mut self.0.write().expect("value lock poisoned")) }

    pub fn readvalue(&self) -> ReadValueCell<T> { ReadValueCell(self.0.clone()) }
}

impl<T: Clone> ValueCell<T> {
    pub fn value(&self) -> T { self.0.read().expect("value lock poisoned").clone() }
}

impl<T> ReadValueCell<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&self.0.read().expect("value lock poisoned")) }
}

impl<T: Clone> ReadValueCell<T> {
    pub fn value(&self) -> T { self.0.read().expect("value lock poisoned").clone() }
}
