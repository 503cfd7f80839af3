//! Registration handles and change-event fan-out.
//!
//! ```text
//! Registry<T>
//! └── BTreeMap<handle, T>   (handles grow monotonically, so iteration
//!                            order is registration order)
//!
//! Emitter<E> = Registry<Listener<E>> + fire()
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Event callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

type Slots<T> = Arc<RwLock<BTreeMap<u64, T>>>;

// =============================================================================
// Disposable
// =============================================================================

/// Handle that undoes a registration when disposed or dropped.
#[must_use = "dropping a Disposable immediately undoes the registration"]
pub struct Disposable {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Disposable {
    /// Create a handle that runs `f` once on disposal.
    pub fn new(f: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            dispose: Some(Box::new(f)),
        }
    }

    /// A handle with nothing to undo.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    /// Undo the registration now.
    pub fn dispose(mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }

    /// Keep the registration for the rest of the process.
    pub fn forget(mut self) {
        self.dispose = None;
    }
}

impl Drop for Disposable {
    fn drop(&mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposable")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Ordered set of registered items addressed by opaque handles.
pub struct Registry<T> {
    next_handle: AtomicU64,
    slots: Slots<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            slots: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item; the returned handle removes it again.
    pub fn register(&self, item: T) -> Disposable {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.slots.write().insert(handle, item);

        let slots: Weak<RwLock<BTreeMap<u64, T>>> = Arc::downgrade(&self.slots);
        Disposable::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.write().remove(&handle);
            }
        })
    }

    /// All registered items, in registration order.
    pub fn snapshot(&self) -> Vec<T> {
        self.slots.read().values().cloned().collect()
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Fan-out of events to subscribed listeners.
pub struct Emitter<E: ?Sized> {
    listeners: Registry<Listener<E>>,
}

impl<E: ?Sized + 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            listeners: Registry::default(),
        }
    }
}

impl<E: ?Sized + 'static> Emitter<E> {
    /// Create an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener.
    pub fn subscribe(&self, listener: Listener<E>) -> Disposable {
        self.listeners.register(listener)
    }

    /// Deliver an event to every listener.
    ///
    /// Listeners run outside the registry lock and may subscribe or
    /// unsubscribe while being called.
    pub fn fire(&self, event: &E) {
        for listener in self.listeners.snapshot() {
            listener(event);
        }
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
