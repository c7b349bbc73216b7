//! Two list viewers sharing one store, one of them mounted and unmounted.
//!
//! Run with `RUST_LOG=debug cargo run --example items_viewer` to see the
//! store's own logging.

use fluxstore::{GlobalStore, Result, StoreConfig, Subscription, TypedSlot};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Model {
    #[serde(rename = "listOfItems")]
    list_of_items: Vec<String>,
}

/// Application store: a typed facade over a generic store.
#[derive(Clone)]
struct MyAppStore {
    model: TypedSlot<Model>,
}

impl MyAppStore {
    fn new(store: &GlobalStore) -> Result<Self> {
        Ok(Self {
            model: TypedSlot::new(store, "model")?,
        })
    }

    fn update_model(&self, model: &Model) -> Result<()> {
        self.model.set(model)
    }

    fn model(&self) -> Model {
        match self.model.get() {
            Ok(model) => model.unwrap_or_default(),
            Err(err) => {
                warn!(store = %self.model.store().name(), error = %err, "unreadable model");
                Model::default()
            }
        }
    }
}

/// A component that re-renders whenever the model changes.
struct ItemsViewer {
    name: &'static str,
    app: MyAppStore,
    handle: Option<Subscription>,
}

impl ItemsViewer {
    fn new(name: &'static str, app: &MyAppStore) -> Self {
        Self {
            name,
            app: app.clone(),
            handle: None,
        }
    }

    fn mount(&mut self) -> Result<()> {
        println!("{}: mount, subscribe to store", self.name);
        let app = self.app.clone();
        let name = self.name;
        self.handle = Some(self.app.model.subscribe(move |_| {
            println!("{}: store changed, rendering", name);
            render(name, &app.model());
        })?);
        render(self.name, &self.app.model());
        Ok(())
    }

    fn unmount(&mut self) {
        println!("{}: unmount, unsubscribe from store", self.name);
        if let Some(handle) = self.handle.take() {
            handle.unsubscribe();
        }
    }
}

fn render(name: &str, model: &Model) {
    for item in &model.list_of_items {
        println!("   [{}] {}", name, item);
    }
}

fn items(round: usize) -> Model {
    Model {
        list_of_items: (1..=3).map(|i| format!("item {} at round {}", i, round)).collect(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Store Example: Items Viewer ===\n");

    let store = GlobalStore::with_config(StoreConfig::default().with_name("MyAppStore"));
    let app = MyAppStore::new(&store)?;
    app.update_model(&Model::default())?;

    let mut first = ItemsViewer::new("viewer-1", &app);
    first.mount()?;

    println!("\n1. Update store");
    app.update_model(&items(1))?;

    println!("\n2. Add another component");
    let mut second = ItemsViewer::new("viewer-2", &app);
    second.mount()?;

    println!("\n3. Update store");
    app.update_model(&items(2))?;

    println!("\n4. Remove the other component");
    second.unmount();

    println!("\n5. Update store");
    app.update_model(&items(3))?;

    first.unmount();
    println!("\nSubscribers left: {}", store.subscriber_count());

    store.dispose();
    if let Err(err) = app.update_model(&items(4)) {
        println!("After dispose: {}", err);
    }

    println!("\n✓ Example complete!");
    Ok(())
}
