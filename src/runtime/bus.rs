use crate::error::{Result, StoreError};
use crate::path::{PathPattern, StorePath};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::any::Any;
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace};

/// Callback invoked with the changed path.
pub(crate) type Callback = Arc<dyn Fn(&str) + Send + Sync>;

/// Lifecycle of the broadcast bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusState {
    /// Accepting and delivering notifications.
    Open,
    /// Completed normally through `dispose`.
    Closed,
    /// Stopped by an error; the reason is kept for diagnostics.
    Failed(String),
}

struct Observer {
    pattern: PathPattern,
    callback: Callback,
    active: Arc<AtomicBool>,
}

/// Hot broadcast channel with pattern-filtered observers.
///
/// Observers are keyed by a monotonically increasing id, so iteration order
/// is subscription order. Published paths are queued and delivered strictly
/// in publish order; a publish issued while a delivery is running on the
/// same thread is picked up by the running delivery loop.
pub(crate) struct Bus {
    name: String,
    next_id: AtomicUsize,
    observers: RwLock<BTreeMap<usize, Observer>>,
    state: RwLock<BusState>,
    pending: Mutex<VecDeque<StorePath>>,
    // Set while this bus is draining `pending`. Reentrant so callbacks on the
    // dispatching thread can publish without deadlocking.
    dispatch: ReentrantMutex<Cell<bool>>,
}

impl Bus {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: AtomicUsize::new(0),
            observers: RwLock::new(BTreeMap::new()),
            state: RwLock::new(BusState::Open),
            pending: Mutex::new(VecDeque::new()),
            dispatch: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Register an observer. Returns its id and its liveness flag.
    ///
    /// A stopped bus keeps nothing: the callback is dropped and the returned
    /// flag is already cleared.
    pub(crate) fn attach(
        &self,
        pattern: PathPattern,
        callback: Callback,
    ) -> (usize, Arc<AtomicBool>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        // Checked under the observer lock so a concurrent `clear` cannot miss it.
        let mut observers = self.observers.write();
        if *self.state.read() != BusState::Open {
            trace!(store = %self.name, id, pattern = %pattern, "bus stopped, subscribe ignored");
            return (id, Arc::new(AtomicBool::new(false)));
        }

        let active = Arc::new(AtomicBool::new(true));
        trace!(store = %self.name, id, pattern = %pattern, "subscribe");
        observers.insert(
            id,
            Observer {
                pattern,
                callback,
                active: Arc::clone(&active),
            },
        );
        (id, active)
    }

    /// Remove an observer. Returns false if it was already gone.
    pub(crate) fn detach(&self, id: usize) -> bool {
        match self.observers.write().remove(&id) {
            Some(observer) => {
                observer.active.store(false, Ordering::SeqCst);
                trace!(store = %self.name, id, pattern = %observer.pattern, "unsubscribe");
                true
            }
            None => false,
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    pub(crate) fn state(&self) -> BusState {
        self.state.read().clone()
    }

    /// Fail with `StoreTerminated` unless the bus is still open.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        match *self.state.read() {
            BusState::Open => Ok(()),
            BusState::Closed | BusState::Failed(_) => Err(StoreError::StoreTerminated {
                store: self.name.clone(),
            }),
        }
    }

    /// Complete the bus. Idempotent; a failed bus stays failed.
    pub(crate) fn close(&self) {
        let mut state = self.state.write();
        if *state == BusState::Open {
            *state = BusState::Closed;
            info!(store = %self.name, "store terminated");
        }
    }

    /// Stop the bus with an error. The first reason wins.
    pub(crate) fn fail(&self, reason: String) {
        let mut state = self.state.write();
        if *state == BusState::Open {
            error!(store = %self.name, %reason, "store error, bus stopped");
            *state = BusState::Failed(reason);
        }
    }

    /// Queue a changed path for delivery.
    pub(crate) fn enqueue(&self, path: StorePath) {
        self.pending.lock().push_back(path);
    }

    /// Deliver every queued path to the matching observers.
    ///
    /// Returns immediately when called from inside a delivery on the same
    /// thread; the outer loop delivers the newly queued path once the
    /// current fan-out completes.
    pub(crate) fn drain(&self) {
        let dispatching = self.dispatch.lock();
        if dispatching.get() {
            return;
        }
        dispatching.set(true);
        let _reset = ResetOnDrop(&dispatching);

        loop {
            let next = self.pending.lock().pop_front();
            match next {
                Some(path) => self.deliver(&path),
                None => break,
            }
        }
    }

    fn deliver(&self, path: &StorePath) {
        let targets: Vec<(Callback, Arc<AtomicBool>)> = self
            .observers
            .read()
            .values()
            .filter(|observer| observer.pattern.matches(path))
            .map(|observer| (Arc::clone(&observer.callback), Arc::clone(&observer.active)))
            .collect();

        if targets.is_empty() {
            return;
        }

        let changed = path.to_string();
        for (callback, active) in targets {
            // An earlier callback in this fan-out may have unsubscribed this one.
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(&changed))) {
                let err = StoreError::SubscriberCallback {
                    path: changed.clone(),
                    message: panic_message(payload.as_ref()),
                };
                error!(store = %self.name, error = %err, "subscriber callback failed");
            }
        }
    }

    /// Drop all observers and pending notifications.
    pub(crate) fn clear(&self) {
        let mut observers = self.observers.write();
        for observer in observers.values() {
            observer.active.store(false, Ordering::SeqCst);
        }
        observers.clear();
        self.pending.lock().clear();
    }
}

struct ResetOnDrop<'a>(&'a Cell<bool>);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> StorePath {
        StorePath::parse(s, "test").unwrap()
    }

    fn counter_callback(counter: &Arc<AtomicUsize>) -> Callback {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn attach_assigns_increasing_ids() {
        let bus = Bus::new("test");
        let (a, _) = bus.attach(PathPattern::parse("a").unwrap(), Arc::new(|_: &str| {}));
        let (b, _) = bus.attach(PathPattern::parse("b").unwrap(), Arc::new(|_: &str| {}));
        assert!(b > a);
        assert_eq!(bus.observer_count(), 2);
    }

    #[test]
    fn detach_deactivates_and_is_idempotent() {
        let bus = Bus::new("test");
        let (id, active) = bus.attach(PathPattern::parse("a").unwrap(), Arc::new(|_: &str| {}));
        assert!(bus.detach(id));
        assert!(!active.load(Ordering::SeqCst));
        assert!(!bus.detach(id));
        assert_eq!(bus.observer_count(), 0);
    }

    #[test]
    fn drain_delivers_only_to_matching() {
        let bus = Bus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        bus.attach(PathPattern::parse("a.*").unwrap(), counter_callback(&hits));

        bus.enqueue(path("a.b"));
        bus.enqueue(path("b.a"));
        bus.enqueue(path("a.c.d"));
        bus.drain();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_observer_is_isolated() {
        let bus = Bus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        bus.attach(PathPattern::parse("x").unwrap(), Arc::new(|_: &str| panic!("boom")));
        bus.attach(PathPattern::parse("x").unwrap(), counter_callback(&hits));

        bus.enqueue(path("x"));
        bus.drain();
        bus.enqueue(path("x"));
        bus.drain();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn close_and_fail_are_terminal() {
        let bus = Bus::new("closing");
        assert!(bus.ensure_open().is_ok());
        bus.close();
        assert_eq!(bus.state(), BusState::Closed);
        bus.fail("late".to_string());
        assert_eq!(bus.state(), BusState::Closed);
        assert!(matches!(
            bus.ensure_open(),
            Err(StoreError::StoreTerminated { ref store }) if store == "closing"
        ));

        let bus = Bus::new("failing");
        bus.fail("channel error".to_string());
        assert_eq!(bus.state(), BusState::Failed("channel error".to_string()));
        assert!(bus.ensure_open().is_err());
    }

    #[test]
    fn stopped_bus_refuses_observers() {
        let payload = Arc::new(AtomicUsize::new(0));

        let closed = Bus::new("closed");
        closed.close();
        let (_, active) = closed.attach(
            PathPattern::parse("a").unwrap(),
            counter_callback(&payload),
        );
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(closed.observer_count(), 0);

        let failed = Bus::new("failed");
        failed.fail("broken".to_string());
        let (_, active) = failed.attach(
            PathPattern::parse("a").unwrap(),
            counter_callback(&payload),
        );
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(failed.observer_count(), 0);

        // Refused callbacks are dropped, not retained.
        assert_eq!(Arc::strong_count(&payload), 1);
    }

    #[test]
    fn clear_drops_observers() {
        let bus = Bus::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        let (_, active) = bus.attach(PathPattern::parse("a").unwrap(), counter_callback(&hits));
        bus.clear();
        assert!(!active.load(Ordering::SeqCst));

        bus.enqueue(path("a"));
        bus.drain();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panic_message_extracts_strings() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
