//! Listener lists with explicit removal

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use model_loader::panic_message;
use parking_lot::Mutex;
use tracing::error;

type Listener<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct Slots<A> {
    next_id: u64,
    entries: Vec<(u64, Listener<A>)>,
}

/// An ordered list of callbacks receiving `&A`.
///
/// Listeners are called in registration order. A panicking listener is
/// logged and does not keep the others from running.
pub struct Listeners<A> {
    slots: Arc<Mutex<Slots<A>>>,
}

impl<A: 'static> Listeners<A> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn add(&self, listener: impl Fn(&A) + Send + Sync + 'static) -> ListenerRegistration {
        let id = {
            let mut slots = self.slots.lock();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Arc::new(listener)));
            id
        };

        let slots: Weak<Mutex<Slots<A>>> = Arc::downgrade(&self.slots);
        ListenerRegistration::new(move || {
            if let Some(slots) = slots.upgrade() {
                slots.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Call every listener with `arg`.
    ///
    /// Runs on a snapshot: listeners added or removed by a listener take
    /// effect from the next call.
    pub fn fire(&self, arg: &A) {
        let snapshot: Vec<Listener<A>> = self
            .slots
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(arg))) {
                error!(panic = %panic_message(payload.as_ref()), "Listener panicked");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: 'static> Default for Listeners<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned for every registered listener.
///
/// Dropping the handle keeps the listener registered; call
/// [`unregister`](Self::unregister) to remove it.
#[must_use = "dropping the registration leaves the listener registered for good"]
pub struct ListenerRegistration {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ListenerRegistration {
    fn new(remove: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// Remove the listener. It is not called again once this returns,
    /// except by a notification already in progress.
    pub fn unregister(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration").finish_non_exhaustive()
    }
}
