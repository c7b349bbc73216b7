use crate::path::PathPattern;
use crate::runtime::Bus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Handle to a registered callback, returned by
/// [`GlobalStore::subscribe`](super::GlobalStore::subscribe).
///
/// Call [`unsubscribe`](Self::unsubscribe) when the consumer goes away.
/// Dropping the handle leaves the callback registered.
#[must_use = "keep the handle to be able to unsubscribe later"]
pub struct Subscription {
    id: usize,
    pattern: PathPattern,
    active: Arc<AtomicBool>,
    bus: Weak<Bus>,
}

impl Subscription {
    pub(crate) fn new(
        id: usize,
        pattern: PathPattern,
        active: Arc<AtomicBool>,
        bus: Weak<Bus>,
    ) -> Self {
        Self {
            id,
            pattern,
            active,
            bus,
        }
    }

    /// Stop receiving notifications.
    ///
    /// Takes effect immediately, including for a fan-out already in progress
    /// that has not reached this callback yet. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(bus) = self.bus.upgrade() {
            bus.detach(self.id);
        }
    }

    /// False once unsubscribed or once the store has released its callbacks.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The pattern this subscription was registered with.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Identifier unique within the owning store.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pattern", &self.pattern.to_string())
            .field("active", &self.is_active())
            .finish()
    }
}
