//! In-memory hierarchical configuration store.
//!
//! [`MemoryTree`] implements the [`typedconf_types::ConfigTree`] contract: live handles, indexed and
//! attribute keys, before/after change events and YAML seeding. It is the store the engine's own
//! tests run against and a reasonable default for applications that keep configuration in memory.

pub mod error;
mod key;
mod node;
pub mod tree;
mod yaml;

pub use error::StoreError;
pub use tree::{DEFAULT_DELIMITER, MemoryTree};
