//! Immutable member bindings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    annotation::{Annotation, ConstraintDescriptor},
    descriptor::TypeDescriptor,
};

/// Behavioral flags attached to a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingOption {
    /// Resolving to nothing is an error.
    Required,
    /// A boolean member answers whether the key exists instead of reading its value.
    CheckKeyExists,
    /// The stored value names another key whose value is the real answer.
    LookupResult,
}

/// Links one schema member to a store key, a declared type, options and metadata.
///
/// Bindings are immutable; every `with_*` method returns a modified copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    key: String,
    data_type: Option<TypeDescriptor>,
    options: Vec<BindingOption>,
    annotations: Vec<Annotation>,
}

impl Binding {
    /// Binds `data_type` to the root of a tree (empty key).
    pub fn root(data_type: TypeDescriptor) -> Self {
        Self::for_key_and_type("", data_type)
    }

    /// A placeholder carrying only a key, used where the type is not yet known.
    pub fn shim_for_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data_type: None,
            options: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn for_key_and_type(key: impl Into<String>, data_type: TypeDescriptor) -> Self {
        Self {
            key: key.into(),
            data_type: Some(data_type),
            options: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data_type(&self) -> Option<&TypeDescriptor> {
        self.data_type.as_ref()
    }

    pub fn options(&self) -> &[BindingOption] {
        &self.options
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn contains_option(&self, option: BindingOption) -> bool {
        self.options.contains(&option)
    }

    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..self.clone()
        }
    }

    pub fn with_data_type(&self, data_type: TypeDescriptor) -> Self {
        Self {
            data_type: Some(data_type),
            ..self.clone()
        }
    }

    /// Replaces the option set, dropping duplicates while keeping first-seen order.
    pub fn with_options(&self, options: impl IntoIterator<Item = BindingOption>) -> Self {
        let mut deduped = Vec::new();
        for option in options {
            if !deduped.contains(&option) {
                deduped.push(option);
            }
        }
        Self {
            options: deduped,
            ..self.clone()
        }
    }

    pub fn with_option(&self, option: BindingOption) -> Self {
        let mut next = self.clone();
        if !next.options.contains(&option) {
            next.options.push(option);
        }
        next
    }

    pub fn without_option(&self, option: BindingOption) -> Self {
        let mut next = self.clone();
        next.options.retain(|existing| *existing != option);
        next
    }

    pub fn with_annotations(&self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        Self {
            annotations: annotations.into_iter().collect(),
            ..self.clone()
        }
    }

    /// The `MapKey` annotation, as `(property, required)`.
    pub fn map_key(&self) -> Option<(&str, bool)> {
        self.annotations.iter().find_map(|annotation| match annotation {
            Annotation::MapKey { property, required } => Some((property.as_str(), *required)),
            Annotation::Constraint(_) => None,
        })
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintDescriptor> {
        self.annotations.iter().filter_map(|annotation| match annotation {
            Annotation::Constraint(descriptor) => Some(descriptor),
            Annotation::MapKey { .. } => None,
        })
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data_type {
            Some(data_type) => write!(f, "'{}' as {}", self.key, data_type),
            None => write!(f, "'{}'", self.key),
        }
    }
}
