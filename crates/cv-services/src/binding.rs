//! # Persistent Key-Value Binding
//!
//! Binds one named slot of a [`KeyValueStore`] to a typed, JSON-encoded value.
//! Reads never fail: an absent, malformed or inaccessible slot resolves to
//! the default supplied at construction. Write failures are logged and the
//! in-process value is updated regardless.
//!
//! A slot whose stored text cannot be decoded is copied to `<key>.corrupt`
//! before anything else touches it.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use cv_core::KeyValueStore;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// What [`Binding::new`] found in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOrigin {
    /// The slot has never been written.
    Absent,
    /// The stored text decoded cleanly.
    Stored,
    /// The slot exists but could not be read or decoded.
    Unreadable,
}

pub struct Binding<T> {
    key: String,
    backend: Arc<dyn KeyValueStore>,
    default: T,
    origin: SlotOrigin,
    current: RwLock<Arc<T>>,
    listeners: Arc<Mutex<Listeners<T>>>,
}

impl<T> Binding<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Loads the slot once; later reads are served from memory until
    /// [`Binding::reload`] is called.
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let (initial, origin) = match read_slot(backend.as_ref(), &key) {
            SlotRead::Absent => (default.clone(), SlotOrigin::Absent),
            SlotRead::Value(value) => (value, SlotOrigin::Stored),
            SlotRead::Malformed(raw) => {
                back_up(backend.as_ref(), &key, &raw);
                (default.clone(), SlotOrigin::Unreadable)
            }
            SlotRead::Unavailable => (default.clone(), SlotOrigin::Unreadable),
        };
        Self {
            key,
            backend,
            default,
            origin,
            current: RwLock::new(Arc::new(initial)),
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn origin(&self) -> SlotOrigin {
        self.origin
    }

    /// An immutable snapshot of the current value.
    pub fn get(&self) -> Arc<T> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persists `value`, replaces the in-memory snapshot and notifies subscribers.
    pub fn set(&self, value: T) {
        self.update(|_| value);
    }

    /// Derives the next value from the current one, like a functional state setter.
    ///
    /// The write lock is held from reading the previous value until the next
    /// one is persisted; concurrent updates never drop each other. `f` must
    /// not touch this binding.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        self.try_update(|prev| Some(f(prev)));
    }

    /// Like [`Binding::update`], but `f` may decline by returning `None`, in
    /// which case nothing is written or published. Returns whether a value
    /// was written.
    pub fn try_update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let snapshot = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let Some(next) = f(&**current) else {
                return false;
            };
            self.persist(&next);
            let snapshot = Arc::new(next);
            *current = snapshot.clone();
            snapshot
        };
        debug!(key = %self.key, "slot updated");
        self.publish(&snapshot);
        true
    }

    /// Replaces the in-memory value and notifies subscribers without writing
    /// the backend.
    pub fn serve(&self, value: T) {
        let snapshot = Arc::new(value);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        self.publish(&snapshot);
    }

    /// Re-reads the backend, replacing the in-memory snapshot without notifying.
    pub fn reload(&self) -> Arc<T> {
        let value = match read_slot(self.backend.as_ref(), &self.key) {
            SlotRead::Value(value) => value,
            _ => self.default.clone(),
        };
        let snapshot = Arc::new(value);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        snapshot
    }

    /// Registers `listener` to receive every value written through [`Binding::set`].
    ///
    /// The listener stays attached until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut guard = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            let id = guard.next_id;
            guard.next_id += 1;
            guard.entries.push((id, Arc::new(listener)));
            id
        };

        let registry: Weak<Mutex<Listeners<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .entries
                        .retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    fn persist(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => {
                if let Err(e) = self.backend.set_item(&self.key, &raw) {
                    warn!(key = %self.key, error = %e, "failed to persist slot");
                }
            }
            Err(e) => warn!(key = %self.key, error = %e, "failed to serialize slot"),
        }
    }

    fn publish(&self, value: &T) {
        // Listeners run outside the lock so they may unsubscribe themselves.
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

enum SlotRead<T> {
    Absent,
    Value(T),
    Malformed(String),
    Unavailable,
}

fn read_slot<T: DeserializeOwned>(backend: &dyn KeyValueStore, key: &str) -> SlotRead<T> {
    match backend.get_item(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => SlotRead::Value(value),
            Err(e) => {
                warn!(key, error = %e, "malformed slot, using default");
                SlotRead::Malformed(raw)
            }
        },
        Ok(None) => SlotRead::Absent,
        Err(e) => {
            warn!(key, error = %e, "storage unavailable, using default");
            SlotRead::Unavailable
        }
    }
}

fn back_up(backend: &dyn KeyValueStore, key: &str, raw: &str) {
    let backup = format!("{key}.corrupt");
    match backend.set_item(&backup, raw) {
        Ok(()) => warn!(key, backup = %backup, "copied unreadable slot aside"),
        Err(e) => warn!(key, error = %e, "failed to back up unreadable slot"),
    }
}

/// Handle returned by `subscribe`; detaches its listener when dropped.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
