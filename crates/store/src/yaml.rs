//! Seeding trees from YAML documents.
//!
//! Mappings become child nodes, sequences become repeated children of the same name, and keys
//! starting with `@` become attributes of the enclosing node. A `null` value yields a node that
//! exists but carries no value.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::{
    error::StoreError,
    node::Node,
    tree::{DEFAULT_DELIMITER, MemoryTree},
};

impl MemoryTree {
    /// Parses `yaml` into a new tree whose root node is called `root_name`.
    pub fn from_yaml_str(root_name: &str, yaml: &str) -> Result<Self, StoreError> {
        let document: YamlValue = serde_yaml::from_str(yaml)?;
        let mut root = Node::named(root_name);
        match document {
            YamlValue::Null => {}
            YamlValue::Mapping(mapping) => populate(&mut root, mapping),
            other => {
                return Err(StoreError::UnsupportedDocument {
                    found: kind_name(&other),
                });
            }
        }
        Ok(Self::from_root(root, DEFAULT_DELIMITER.to_string()))
    }

    /// Loads a YAML file. The root node is named after the file stem.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("read configuration {}", path.display()))?;
        let root_name = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("configuration");
        let tree = Self::from_yaml_str(root_name, &content).with_context(|| format!("parse configuration {}", path.display()))?;
        debug!(path = %path.display(), root = root_name, "loaded configuration tree");
        Ok(tree)
    }
}

fn populate(node: &mut Node, mapping: serde_yaml::Mapping) {
    for (key, value) in mapping {
        let Some(name) = scalar_text(&key) else { continue };
        if let Some(attribute) = name.strip_prefix('@') {
            if let Some(text) = scalar_text(&value) {
                node.attributes.insert(attribute.to_string(), text);
            }
            continue;
        }
        match value {
            YamlValue::Sequence(items) => {
                for item in items {
                    node.children.push(build_child(&name, item));
                }
            }
            other => node.children.push(build_child(&name, other)),
        }
    }
}

fn build_child(name: &str, value: YamlValue) -> Node {
    let mut child = Node::named(name);
    match value {
        YamlValue::Mapping(mapping) => populate(&mut child, mapping),
        YamlValue::Tagged(tagged) => return build_child(name, tagged.value),
        other => child.value = scalar_text(&other),
    }
    child
}

fn scalar_text(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(text) => Some(text.clone()),
        YamlValue::Bool(flag) => Some(flag.to_string()),
        YamlValue::Number(number) => Some(number.to_string()),
        YamlValue::Tagged(tagged) => scalar_text(&tagged.value),
        YamlValue::Null | YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}

fn kind_name(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "boolean",
        YamlValue::Number(_) => "number",
        YamlValue::String(_) => "string",
        YamlValue::Sequence(_) => "sequence",
        YamlValue::Mapping(_) => "mapping",
        YamlValue::Tagged(_) => "tagged value",
    }
}
