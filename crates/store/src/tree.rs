//! Live, path-based handles over a shared in-memory tree.

use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use tracing::{debug, trace};
use typedconf_types::{ChangeEvent, ChangeKind, ChangeListener, ChangePhase, ConfigTree, KeyDialect, TreeHandle};

use crate::{
    error::StoreError,
    key::KeyExpr,
    node::{Node, Step, render_path},
};

pub const DEFAULT_DELIMITER: &str = ".";

struct Shared {
    root: RwLock<Node>,
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
    delimiter: String,
}

/// A handle onto one node of an in-memory configuration tree.
///
/// Handles do not copy data. Each call re-locates the node by its path from the root, so a handle
/// observes every later mutation, whichever handle performed it. A handle whose node has been
/// removed reads as empty.
#[derive(Clone)]
pub struct MemoryTree {
    shared: Arc<Shared>,
    path: Vec<Step>,
    /// Length of `path` for the handle this one was derived from.
    origin: usize,
}

impl MemoryTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_delimiter(root_name, DEFAULT_DELIMITER)
    }

    pub fn with_delimiter(root_name: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self::from_root(Node::named(root_name), delimiter.into())
    }

    pub(crate) fn from_root(root: Node, delimiter: String) -> Self {
        Self {
            shared: Arc::new(Shared {
                root: RwLock::new(root),
                listeners: RwLock::new(Vec::new()),
                delimiter,
            }),
            path: Vec::new(),
            origin: 0,
        }
    }

    /// This handle as a shareable trait object.
    pub fn handle(&self) -> TreeHandle {
        Arc::new(self.clone())
    }

    pub fn delimiter(&self) -> &str {
        &self.shared.delimiter
    }

    /// Absolute key of this handle from the store root.
    pub fn absolute_key(&self) -> String {
        render_path(&self.path, &self.shared.delimiter)
    }

    /// Whether the node behind this handle still exists.
    pub fn is_attached(&self) -> bool {
        self.shared.root.read().at(&self.path).is_some()
    }

    /// The single node addressed by `key`, as a concrete handle.
    pub fn sub_tree_at(&self, key: &str) -> Option<MemoryTree> {
        let mut matches = self.sub_trees_at(key);
        if matches.len() == 1 { matches.pop() } else { None }
    }

    pub fn sub_trees_at(&self, key: &str) -> Vec<MemoryTree> {
        let Some(expr) = self.parse_for_read(key) else {
            return Vec::new();
        };
        if expr.attribute.is_some() {
            return Vec::new();
        }
        let root = self.shared.root.read();
        let Some(node) = root.at(&self.path) else {
            return Vec::new();
        };
        node.select(&expr.segments)
            .into_iter()
            .map(|(relative, _)| {
                let mut path = self.path.clone();
                path.extend(relative);
                MemoryTree {
                    shared: Arc::clone(&self.shared),
                    path,
                    origin: self.path.len(),
                }
            })
            .collect()
    }

    /// Sets the value at `key`, creating missing nodes. Existing repeated nodes keep their siblings;
    /// the first match is updated.
    pub fn set_property(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        let value = value.into();
        let expr = self.parse(key)?;
        self.mutate(ChangeKind::SetProperty, key, Some(value.clone()), |node| {
            let target = node.ensure(&expr.segments);
            match &expr.attribute {
                Some(attribute) => {
                    target.attributes.insert(attribute.clone(), value);
                }
                None => target.value = Some(value),
            }
        })
    }

    /// Appends a new node at `key`, even when nodes with that name already exist.
    pub fn add_property(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        let value = value.into();
        let expr = self.parse(key)?;
        self.mutate(ChangeKind::AddProperty, key, Some(value.clone()), |node| {
            if let Some(attribute) = &expr.attribute {
                node.ensure(&expr.segments).attributes.insert(attribute.clone(), value);
                return;
            }
            match expr.split_last() {
                Some((parents, last)) => {
                    let parent = node.ensure(parents);
                    parent.children.push(Node::with_value(last.name.clone(), value));
                }
                None => node.value = Some(value),
            }
        })
    }

    /// Removes the value (or attribute) at `key`; the nodes themselves stay.
    pub fn clear_property(&self, key: &str) -> Result<(), StoreError> {
        let expr = self.parse(key)?;
        self.mutate(ChangeKind::ClearProperty, key, None, |node| {
            let paths: Vec<Vec<Step>> = node.select(&expr.segments).into_iter().map(|(path, _)| path).collect();
            for path in paths {
                let Some(target) = node.at_mut(&path) else { continue };
                match &expr.attribute {
                    Some(attribute) => {
                        target.attributes.shift_remove(attribute);
                    }
                    None => target.value = None,
                }
            }
        })
    }

    /// Removes every node addressed by `key` together with its descendants.
    pub fn clear_tree(&self, key: &str) -> Result<(), StoreError> {
        let expr = self.parse(key)?;
        self.mutate(ChangeKind::ClearTree, key, None, |node| {
            if let Some(attribute) = &expr.attribute {
                let paths: Vec<Vec<Step>> = node.select(&expr.segments).into_iter().map(|(path, _)| path).collect();
                for path in paths {
                    if let Some(target) = node.at_mut(&path) {
                        target.attributes.shift_remove(attribute);
                    }
                }
                return;
            }
            if expr.segments.is_empty() {
                node.children.clear();
                node.attributes.clear();
                node.value = None;
                return;
            }
            let mut paths: Vec<Vec<Step>> = node.select(&expr.segments).into_iter().map(|(path, _)| path).collect();
            // Later siblings first so earlier indices stay valid.
            paths.sort();
            for path in paths.iter().rev() {
                node.remove(path);
            }
        })
    }

    fn parse(&self, key: &str) -> Result<KeyExpr, StoreError> {
        KeyExpr::parse(key, &self.shared.delimiter)
    }

    fn parse_for_read(&self, key: &str) -> Option<KeyExpr> {
        match self.parse(key) {
            Ok(expr) => Some(expr),
            Err(error) => {
                trace!(key, %error, "unparseable key treated as absent");
                None
            }
        }
    }

    fn mutate(&self, kind: ChangeKind, key: &str, value: Option<String>, apply: impl FnOnce(&mut Node)) -> Result<(), StoreError> {
        let event_key = self.event_key(key);
        self.fire(kind, &event_key, value.clone(), ChangePhase::Before);
        {
            let mut root = self.shared.root.write();
            let node = root.at_mut(&self.path).ok_or_else(|| StoreError::Detached {
                path: self.absolute_key(),
            })?;
            apply(node);
        }
        debug!(?kind, key = %event_key, value = value.as_deref().unwrap_or(""), "configuration mutated");
        self.fire(kind, &event_key, value, ChangePhase::After);
        Ok(())
    }

    fn event_key(&self, key: &str) -> String {
        let prefix = self.absolute_key();
        match (prefix.is_empty(), key.is_empty() || key.starts_with("[@")) {
            (true, _) => key.to_string(),
            (false, true) => format!("{prefix}{key}"),
            (false, false) => format!("{prefix}{}{key}", self.shared.delimiter),
        }
    }

    fn fire(&self, kind: ChangeKind, key: &str, value: Option<String>, phase: ChangePhase) {
        let listeners = self.shared.listeners.read().clone();
        if listeners.is_empty() {
            return;
        }
        let event = ChangeEvent {
            kind,
            key: key.to_string(),
            value,
            phase,
        };
        for listener in listeners {
            listener.configuration_changed(&event);
        }
    }

    fn read_node<R>(&self, read: impl FnOnce(&Node) -> R) -> Option<R> {
        let root = self.shared.root.read();
        root.at(&self.path).map(read)
    }
}

impl ConfigTree for MemoryTree {
    fn scalar(&self, key: &str) -> Option<String> {
        self.repeated_scalars(key).into_iter().next()
    }

    fn repeated_scalars(&self, key: &str) -> Vec<String> {
        let Some(expr) = self.parse_for_read(key) else {
            return Vec::new();
        };
        self.read_node(|node| {
            node.select(&expr.segments)
                .into_iter()
                .filter_map(|(_, matched)| match &expr.attribute {
                    Some(attribute) => matched.attributes.get(attribute).cloned(),
                    None => matched.value.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
    }

    fn sub_tree(&self, key: &str) -> Option<TreeHandle> {
        self.sub_tree_at(key).map(|tree| Arc::new(tree) as TreeHandle)
    }

    fn sub_trees(&self, key: &str) -> Vec<TreeHandle> {
        self.sub_trees_at(key)
            .into_iter()
            .map(|tree| Arc::new(tree) as TreeHandle)
            .collect()
    }

    fn contains_key(&self, key: &str) -> bool {
        let Some(expr) = self.parse_for_read(key) else {
            return false;
        };
        self.read_node(|node| {
            let matched = node.select(&expr.segments);
            match &expr.attribute {
                Some(attribute) => matched.iter().any(|(_, node)| node.attributes.contains_key(attribute)),
                None => !matched.is_empty(),
            }
        })
        .unwrap_or(false)
    }

    fn relative_key(&self) -> String {
        render_path(&self.path[self.origin..], &self.shared.delimiter)
    }

    fn root_name(&self) -> String {
        self.shared.root.read().name.clone()
    }

    fn keys(&self) -> Vec<String> {
        self.read_node(|node| {
            let mut keys = Vec::new();
            node.collect_keys("", &self.shared.delimiter, &mut keys);
            keys
        })
        .unwrap_or_default()
    }

    fn dialect(&self) -> KeyDialect {
        KeyDialect::Delimited(self.shared.delimiter.clone())
    }

    fn subscribe(&self, listener: Arc<dyn ChangeListener>) {
        let mut listeners = self.shared.listeners.write();
        let incoming = Arc::as_ptr(&listener) as *const ();
        if listeners.iter().any(|existing| Arc::as_ptr(existing) as *const () == incoming) {
            return;
        }
        listeners.push(listener);
    }
}

impl fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTree")
            .field("root", &self.root_name())
            .field("path", &self.absolute_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use typedconf_types::print_tree;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ChangeEvent>>,
    }

    impl ChangeListener for Recorder {
        fn configuration_changed(&self, event: &ChangeEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn car() -> MemoryTree {
        let tree = MemoryTree::new("car");
        tree.set_property("[@name]", "Roadster").expect("set attribute");
        tree.set_property("engine.power", "150").expect("set power");
        tree.add_property("wheel", "front").expect("add wheel");
        tree.add_property("wheel", "rear").expect("add wheel");
        tree
    }

    #[test]
    fn reads_values_attributes_and_repeats() {
        let tree = car();
        assert_eq!(tree.scalar("[@name]").as_deref(), Some("Roadster"));
        assert_eq!(tree.scalar("engine.power").as_deref(), Some("150"));
        assert_eq!(tree.repeated_scalars("wheel"), vec!["front", "rear"]);
        assert_eq!(tree.scalar("wheel(1)").as_deref(), Some("rear"));
        assert_eq!(tree.scalar("missing"), None);
        assert_eq!(tree.scalar("engine"), None);
    }

    #[test]
    fn sub_tree_requires_a_single_match() {
        let tree = car();
        assert!(tree.sub_tree("wheel").is_none());
        assert_eq!(tree.sub_trees("wheel").len(), 2);
        let wheel = tree.sub_tree("wheel(1)").expect("indexed wheel");
        assert_eq!(wheel.relative_key(), "wheel(1)");
        assert_eq!(wheel.scalar("").as_deref(), Some("rear"));
    }

    #[test]
    fn contains_key_sees_valueless_nodes() {
        let tree = car();
        tree.set_property("air-conditioning", "").expect("set");
        tree.clear_property("air-conditioning").expect("clear");
        assert!(tree.contains_key("air-conditioning"));
        assert!(tree.contains_key("engine"));
        assert!(tree.contains_key("[@name]"));
        assert!(!tree.contains_key("[@color]"));
        assert!(!tree.contains_key("trunk"));
    }

    #[test]
    fn handles_observe_later_mutations() {
        let tree = car();
        let engine = tree.sub_tree("engine").expect("engine");
        tree.set_property("engine.power", "200").expect("update");
        assert_eq!(engine.scalar("power").as_deref(), Some("200"));

        tree.clear_tree("engine").expect("remove");
        assert_eq!(engine.scalar("power"), None);
        assert!(engine.keys().is_empty());
    }

    #[test]
    fn mutations_fire_before_then_after() {
        let tree = car();
        let recorder = Arc::new(Recorder::default());
        tree.subscribe(recorder.clone());
        tree.subscribe(recorder.clone());

        let engine = tree.sub_tree_at("engine").expect("engine");
        engine.set_property("power", "99").expect("set");

        let events = recorder.events.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, ChangePhase::Before);
        assert_eq!(events[1].phase, ChangePhase::After);
        assert_eq!(events[1].key, "engine(0).power");
        assert_eq!(events[1].value.as_deref(), Some("99"));
        assert_eq!(events[1].kind, ChangeKind::SetProperty);
    }

    #[test]
    fn clear_tree_removes_all_matches() {
        let tree = car();
        tree.clear_tree("wheel").expect("clear");
        assert!(tree.repeated_scalars("wheel").is_empty());
        assert_eq!(tree.scalar("engine.power").as_deref(), Some("150"));
    }

    #[test]
    fn detached_handle_rejects_mutation() {
        let tree = car();
        let engine = tree.sub_tree_at("engine").expect("engine");
        tree.clear_tree("engine").expect("clear");
        assert!(!engine.is_attached());
        assert!(matches!(engine.set_property("power", "1"), Err(StoreError::Detached { .. })));
    }

    #[test]
    fn printer_lists_valued_keys() {
        let tree = car();
        let dump = print_tree(&tree);
        assert_eq!(
            dump,
            "Configuration root: car\n---\n  [[@name]] -> Roadster\n  [engine.power] -> 150\n  [wheel(0)] -> front\n  [wheel(1)] -> rear\n"
        );
    }

    #[test]
    fn slash_delimiter_is_reported_as_dialect() {
        let tree = MemoryTree::with_delimiter("root", "/");
        tree.set_property("a/b", "1").expect("set");
        assert_eq!(tree.scalar("a/b").as_deref(), Some("1"));
        assert_eq!(tree.dialect(), KeyDialect::Delimited("/".into()));
    }
}
