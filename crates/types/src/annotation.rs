//! Opaque member metadata consumed by individual pipeline strategies.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata attached to a schema member.
///
/// The binding carries annotations through the pipeline untouched; only the strategy that
/// understands a given annotation acts on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// Names the element property whose value becomes the key of a map container.
    MapKey {
        property: String,
        /// When true, looking up a missing map key is an error rather than an absent result.
        #[serde(default = "default_true")]
        required: bool,
    },
    /// A validation rule evaluated by the configured constraint validator.
    Constraint(ConstraintDescriptor),
}

fn default_true() -> bool {
    true
}

impl Annotation {
    pub fn map_key(property: impl Into<String>) -> Self {
        Self::MapKey {
            property: property.into(),
            required: true,
        }
    }

    pub fn optional_map_key(property: impl Into<String>) -> Self {
        Self::MapKey {
            property: property.into(),
            required: false,
        }
    }

    pub fn constraint(descriptor: ConstraintDescriptor) -> Self {
        Self::Constraint(descriptor)
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

/// A named constraint with free-form attributes, e.g. `min` with `value = "1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl ConstraintDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}
