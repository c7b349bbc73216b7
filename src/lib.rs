//! # Fluxstore
//!
//! A path-addressable, observable state store following a simplified Flux
//! data flow: one source of truth, mutation only through `send`, and a
//! broadcast of every changed path to interested subscribers.
//!
//! ## Store
//!
//! - `GlobalStore` - nested state tree addressed by dotted paths (`a.b.c`)
//! - `send(path, value)` writes, then notifies subscribers synchronously
//! - `get(path)` returns a deep copy, or `None` if the path was never written
//! - `subscribe(path, callback)` with exact (`a.b`) or wildcard (`a.*`)
//!   patterns; callbacks receive the changed path, not the value
//!
//! ## Typed access
//!
//! - `TypedSlot<T>` - binds one path to a serde type for domain facades
//!
//! ## Paths
//!
//! - `StorePath` and `PathPattern` - parsed paths and explicit matching

pub mod error;
pub mod path;
pub mod runtime;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use path::{PathPattern, StorePath};
pub use runtime::BusState;
pub use store::{GlobalStore, StoreConfig, StoreValue, Subscription, TypedSlot};
