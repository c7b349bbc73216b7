//! The observable state store.
//!
//! Stores hold a nested state tree addressed by dotted paths, broadcast the
//! path of every change to pattern-filtered subscribers, and hand out deep
//! copies on read.

mod config;
mod slot;
mod store;
mod subscription;
mod tree;

pub use config::StoreConfig;
pub use slot::TypedSlot;
pub use store::{GlobalStore, StoreValue};
pub use subscription::Subscription;
