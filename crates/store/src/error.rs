use thiserror::Error;

/// Errors surfaced by [`crate::MemoryTree`] mutations and seeding.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not follow the `name(index).name[@attr]` grammar.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
    /// The node a handle points at was removed from the store.
    #[error("node '{path}' no longer exists in the store")]
    Detached { path: String },
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Only mappings can seed a tree root.
    #[error("YAML document root must be a mapping, found {found}")]
    UnsupportedDocument { found: &'static str },
}
