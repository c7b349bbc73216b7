//! Broadcast infrastructure behind the store.
//!
//! This module provides the observer list, ordered delivery of change
//! notifications, and the bus lifecycle.

mod bus;

pub use bus::BusState;
pub(crate) use bus::Bus;
