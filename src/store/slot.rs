use super::store::GlobalStore;
use super::subscription::Subscription;
use crate::error::Result;
use crate::path::StorePath;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A typed view of one path in a [`GlobalStore`].
///
/// Domain stores are built by composing slots rather than wrapping the store
/// API by hand:
///
/// ```
/// use fluxstore::{GlobalStore, TypedSlot};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Debug, PartialEq)]
/// struct Model {
///     #[serde(rename = "listOfItems")]
///     list_of_items: Vec<String>,
/// }
///
/// let store = GlobalStore::new();
/// let model: TypedSlot<Model> = TypedSlot::new(&store, "model").unwrap();
///
/// model.set(&Model { list_of_items: vec!["x".into()] }).unwrap();
/// assert_eq!(model.get().unwrap().unwrap().list_of_items, ["x"]);
/// ```
pub struct TypedSlot<T> {
    store: GlobalStore,
    path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSlot<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a slot to `path`. The path is validated once here.
    pub fn new(store: &GlobalStore, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        StorePath::parse(&path, "slot")?;
        Ok(Self {
            store: store.clone(),
            path,
            _marker: PhantomData,
        })
    }

    /// The dotted path this slot reads and writes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serialize `value` into the slot's path and notify subscribers.
    pub fn set(&self, value: &T) -> Result<()> {
        self.store.send_serialized(&self.path, value)
    }

    /// `Ok(None)` until the path has been written.
    pub fn get(&self) -> Result<Option<T>> {
        self.store.get_as(&self.path)
    }

    /// Subscribe to changes at exactly this path.
    pub fn subscribe<F>(&self, on_update: F) -> Result<Subscription>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.store.subscribe(&self.path, on_update)
    }

    /// The store this slot is bound to.
    pub fn store(&self) -> &GlobalStore {
        &self.store
    }
}

impl<T> Clone for TypedSlot<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn invalid_path_rejected() {
        let store = GlobalStore::new();
        assert!(matches!(
            TypedSlot::<u32>::new(&store, ""),
            Err(StoreError::InvalidArgument { operation: "slot", .. })
        ));
    }

    #[test]
    fn set_get_and_notify() {
        let store = GlobalStore::new();
        let counter: TypedSlot<u32> = TypedSlot::new(&store, "stats.count").unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let sub = counter
            .subscribe(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(counter.get().unwrap(), None);
        counter.set(&7).unwrap();
        assert_eq!(counter.get().unwrap(), Some(7));
        assert_eq!(store.get("stats").unwrap(), Some(serde_json::json!({"count": 7})));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        counter.clone().set(&8).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(counter.store().get("stats.count").unwrap(), Some(serde_json::json!(8)));
    }
}
