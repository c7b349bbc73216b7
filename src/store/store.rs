use super::config::StoreConfig;
use super::subscription::Subscription;
use super::tree;
use crate::error::Result;
use crate::path::{PathPattern, StorePath};
use crate::runtime::{Bus, BusState};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Any value the store can hold. Objects form the nested state tree.
pub type StoreValue = Value;

struct StoreInner {
    config: StoreConfig,
    state: RwLock<Value>,
    bus: Arc<Bus>,
}

/// A path-addressable, observable state container.
///
/// The store holds a single state tree. It is only ever mutated through
/// [`send`](Self::send), which writes the value and then notifies every
/// subscriber whose pattern matches the changed path. Notifications carry the
/// path only; subscribers call [`get`](Self::get) to pull a fresh copy.
///
/// Cloning a `GlobalStore` yields another handle to the same state.
///
/// # Examples
///
/// ```
/// use fluxstore::GlobalStore;
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
///
/// let store = GlobalStore::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sub = store
///     .subscribe("model.*", {
///         let seen = Arc::clone(&seen);
///         move |path: &str| seen.lock().unwrap().push(path.to_string())
///     })
///     .unwrap();
///
/// store.send("model.listOfItems", json!(["x", "y"])).unwrap();
/// assert_eq!(*seen.lock().unwrap(), ["model.listOfItems"]);
/// assert_eq!(store.get("model").unwrap(), Some(json!({"listOfItems": ["x", "y"]})));
///
/// sub.unsubscribe();
/// ```
pub struct GlobalStore {
    inner: Arc<StoreInner>,
}

impl GlobalStore {
    /// Create an empty store with default settings.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given settings.
    pub fn with_config(config: StoreConfig) -> Self {
        let bus = Arc::new(Bus::new(config.name.clone()));
        Self {
            inner: Arc::new(StoreInner {
                config,
                state: RwLock::new(tree::empty()),
                bus,
            }),
        }
    }

    /// The configured store name, as used in logs and errors.
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Settings this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Write `value` at `path` and notify matching subscribers.
    ///
    /// Missing parents are created as empty mappings and the final segment is
    /// replaced, never merged. All matching callbacks have run by the time
    /// this returns. Fails with `StoreTerminated` once the store is disposed
    /// or terminated; the state is left untouched in that case.
    pub fn send(&self, path: &str, value: impl Into<StoreValue>) -> Result<()> {
        let path = StorePath::parse(path, "send")?;
        let value = value.into();

        if self.inner.config.log_values {
            debug!(store = %self.name(), %path, %value, "receive");
        } else {
            debug!(store = %self.name(), %path, "receive");
        }

        {
            let mut state = self.inner.state.write();
            self.inner.bus.ensure_open()?;
            tree::assign(&mut state, &path, value)?;
            // Queued under the state lock so delivery order matches write order.
            self.inner.bus.enqueue(path);
        }
        self.inner.bus.drain();
        Ok(())
    }

    /// Serialize `value` and [`send`](Self::send) it.
    pub fn send_serialized<T>(&self, path: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.send(path, value)
    }

    /// Read a deep copy of the value at `path`.
    ///
    /// `Ok(None)` means nothing was ever written there, which is distinct
    /// from `Ok(Some(Value::Null))`.
    pub fn get(&self, path: &str) -> Result<Option<StoreValue>> {
        let path = StorePath::parse(path, "get")?;
        let state = self.inner.state.read();
        Ok(tree::lookup(&state, &path).cloned())
    }

    /// Read the value at `path` and deserialize it into `T`.
    pub fn get_as<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get(path)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Deep copy of the whole state tree.
    pub fn snapshot(&self) -> StoreValue {
        self.inner.state.read().clone()
    }

    /// Register `on_update` for changes matching `path`.
    ///
    /// `path` is either exact (`a.b`) or a prefix wildcard (`a.*`, any path
    /// strictly below `a`). The callback receives the changed path. A panic
    /// inside it is caught and logged; delivery to other subscribers goes on.
    ///
    /// Dropping the returned handle does not unsubscribe. On a disposed or
    /// terminated store this still succeeds, but the callback is dropped
    /// right away and the handle starts out inactive.
    pub fn subscribe<F>(&self, path: &str, on_update: F) -> Result<Subscription>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let pattern = PathPattern::parse(path)?;
        let (id, active) = self.inner.bus.attach(pattern.clone(), Arc::new(on_update));
        Ok(Subscription::new(
            id,
            pattern,
            active,
            Arc::downgrade(&self.inner.bus),
        ))
    }

    /// Close the store: later sends fail and all subscriptions are released.
    ///
    /// The last state stays readable.
    pub fn dispose(&self) {
        self.inner.bus.close();
        self.inner.bus.clear();
    }

    /// Stop the store because of an unrecoverable error.
    ///
    /// Every later `send` fails with `StoreTerminated` and all subscriptions
    /// are released. There is no restart; replace the instance instead.
    pub fn terminate(&self, reason: impl Into<String>) {
        self.inner.bus.fail(reason.into());
        self.inner.bus.clear();
    }

    /// False once the store has been disposed or terminated.
    pub fn is_alive(&self) -> bool {
        self.inner.bus.state() == BusState::Open
    }

    /// Lifecycle state of the underlying broadcast bus.
    pub fn bus_state(&self) -> BusState {
        self.inner.bus.state()
    }

    /// Number of currently registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.bus.observer_count()
    }
}

impl Default for GlobalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for GlobalStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for GlobalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalStore")
            .field("name", &self.inner.config.name)
            .field("state", &self.inner.bus.state())
            .field("subscribers", &self.inner.bus.observer_count())
            .finish()
    }
}
