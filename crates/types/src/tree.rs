//! Contract of the hierarchical configuration store.
//!
//! The engine never owns configuration data. It reads through [`ConfigTree`] handles and learns
//! about mutations through [`ChangeListener`] callbacks. Any store that can answer these queries
//! can back a schema proxy.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Shared handle to a (sub-)tree of a configuration store.
pub type TreeHandle = Arc<dyn ConfigTree>;

/// How a store spells hierarchical keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDialect {
    /// Segments joined by the given delimiter, e.g. `"."` for `a.b.c`.
    Delimited(String),
    /// XPath-like keys (`a/b/c`).
    XPath,
    /// Anything the engine cannot classify.
    Other,
}

/// Read access to a hierarchical key/value tree.
///
/// Keys are relative to the handle they are passed to. A handle stays valid while the store is
/// mutated and always reflects the current contents of the node it addresses.
pub trait ConfigTree: fmt::Debug + Send + Sync {
    /// Text stored at `key`, or `None` when the key is absent or carries no value.
    fn scalar(&self, key: &str) -> Option<String>;

    /// All values stored under `key` when it addresses repeated nodes, in store order.
    fn repeated_scalars(&self, key: &str) -> Vec<String>;

    /// The single node addressed by `key`, or `None` when zero or several nodes match.
    fn sub_tree(&self, key: &str) -> Option<TreeHandle>;

    /// Every node addressed by `key`, in store order.
    fn sub_trees(&self, key: &str) -> Vec<TreeHandle>;

    /// Whether `key` addresses at least one node or attribute, with or without a value.
    fn contains_key(&self, key: &str) -> bool;

    /// Key of this handle relative to the handle it was obtained from.
    fn relative_key(&self) -> String;

    /// Name of the root node of the whole store.
    fn root_name(&self) -> String;

    /// Every key under this handle that carries a value, in store order.
    fn keys(&self) -> Vec<String>;

    fn dialect(&self) -> KeyDialect;

    /// Registers `listener` for change events of the whole store. Registering the same listener
    /// twice has no effect.
    fn subscribe(&self, listener: Arc<dyn ChangeListener>);
}

/// Which mutation produced a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    SetProperty,
    AddProperty,
    ClearProperty,
    ClearTree,
}

/// Whether the event is delivered before or after the store applies the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePhase {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub key: String,
    pub value: Option<String>,
    pub phase: ChangePhase,
}

impl ChangeEvent {
    pub fn is_after(&self) -> bool {
        self.phase == ChangePhase::After
    }
}

pub trait ChangeListener: Send + Sync {
    fn configuration_changed(&self, event: &ChangeEvent);
}

/// Renders every valued key of `tree` for diagnostics.
///
/// ```text
/// Configuration root: car
/// ---
///   [doors] -> 4
/// ```
pub fn print_tree(tree: &dyn ConfigTree) -> String {
    let mut out = format!("Configuration root: {}\n---\n", tree.root_name());
    for key in tree.keys() {
        let value = tree.scalar(&key).unwrap_or_default();
        out.push_str(&format!("  [{key}] -> {value}\n"));
    }
    out
}
