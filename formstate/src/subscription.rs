//! Change-notification plumbing shared by [`State`](crate::state::State),
//! [`Field`](crate::field::Field) and [`Form`](crate::form::Form).

use std::sync::{Arc, Mutex};

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

/// A set of change listeners.
///
/// Cheap to clone; all clones share the same registry. Callbacks are invoked
/// in subscription order, outside the registry lock, so a listener may itself
/// subscribe or drop a [`Subscription`] without deadlocking.
pub struct Listeners<E> {
    inner: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> Listeners<E> {
    /// Create an empty listener set
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(|p| p.into_inner());
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(callback)));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade()
                && let Ok(mut registry) = inner.lock()
            {
                registry.entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Invoke every registered callback with `event`.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = {
            let registry = self.inner.lock().unwrap_or_else(|p| p.into_inner());
            registry
                .entries
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };

        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|registry| registry.entries.len())
            .unwrap_or(0)
    }

    /// Check if nobody is listening
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.lock().map(|r| r.entries.len()).unwrap_or(0);
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}

/// Guard for a registered listener.
///
/// Dropping the guard unsubscribes the listener.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered for as long as its source lives.
    pub fn forget(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
