use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::subscription::{Listeners, Subscription};

/// Observable value cell.
///
/// `State<T>` is the reactive value a field observes. It uses
/// `Arc<RwLock<T>>` internally, making it cheap to clone and safe to share
/// between the UI layer that writes it and the field that watches it.
///
/// Every `set`/`update` notifies subscribers exactly once, synchronously,
/// after the new value is in place and the write lock has been released.
///
/// # Example
///
/// ```
/// use formstate::state::State;
///
/// let email = State::new(String::new());
/// let _sub = email.subscribe(|value: &String| println!("email is now {value}"));
/// email.set("a@b.com".to_string());
/// assert_eq!(email.get(), "a@b.com");
/// ```
pub struct State<T> {
    inner: Arc<RwLock<T>>,
    dirty: Arc<AtomicBool>,
    listeners: Listeners<T>,
}

impl<T: 'static> State<T> {
    /// Create a new state with the given value
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
            dirty: Arc::new(AtomicBool::new(false)),
            listeners: Listeners::new(),
        }
    }

    /// Get a clone of the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Run a closure against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Set a new value
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        if let Ok(mut guard) = self.inner.write() {
            *guard = value;
            self.dirty.store(true, Ordering::SeqCst);
        } else {
            return;
        }
        self.emit();
    }

    /// Update the value using a closure
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
        T: Clone,
    {
        if let Ok(mut guard) = self.inner.write() {
            f(&mut guard);
            self.dirty.store(true, Ordering::SeqCst);
        } else {
            return;
        }
        self.emit();
    }

    /// Subscribe to changes. The callback receives the new value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Check if the state has been modified since last check
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    fn emit(&self)
    where
        T: Clone,
    {
        if self.listeners.is_empty() {
            return;
        }
        // Notify from a snapshot so listeners may read or write the cell.
        let snapshot = self.get();
        self.listeners.notify(&snapshot);
    }
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
            listeners: self.listeners.clone(),
        }
    }
}

impl<T: Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("State");
        match self.inner.read() {
            Ok(guard) => s.field("value", &*guard),
            Err(_) => s.field("value", &"<poisoned>"),
        };
        s.field("dirty", &self.dirty.load(Ordering::SeqCst)).finish()
    }
}
