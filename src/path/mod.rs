//! Dotted path parsing and subscription pattern matching.
//!
//! Paths like `model.listOfItems` are parsed once into segments. Patterns
//! are either exact paths or `prefix.*` wildcards.

mod path;

pub use path::{PathPattern, StorePath};
