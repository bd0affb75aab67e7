//! Declarative schema tables.
//!
//! A [`SchemaSpec`] lists the members of one configuration schema together with everything the engine
//! needs to bind them: the store key, the declared type, binding options, defaults and annotations.
//! Schemas are plain data and can be assembled with the builder methods below or deserialized from
//! YAML/JSON.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{annotation::Annotation, binding::BindingOption, descriptor::TypeDescriptor};

static ACCESSOR_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(get|is|set)(_?)(.+)$").expect("accessor regex compiles"));

/// One configuration schema: a named set of typed members rooted at `base_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub name: String,
    /// Prefix combined with every member key. Empty binds members relative to the tree root.
    #[serde(default)]
    pub base_key: String,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

impl SchemaSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_key: String::new(),
            members: Vec::new(),
        }
    }

    pub fn with_base_key(mut self, base_key: impl Into<String>) -> Self {
        self.base_key = base_key.into();
        self
    }

    pub fn with_member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    pub fn member(&self, name: &str) -> Option<&MemberSpec> {
        self.members.iter().find(|member| member.name == name)
    }

    /// Looks a member up by its derived property name (`getCity` answers to `city`).
    pub fn member_by_property(&self, property: &str) -> Option<&MemberSpec> {
        self.members
            .iter()
            .find(|member| member.property_name().as_deref() == Some(property) || member.name == property)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// One member of a [`SchemaSpec`].
///
/// `options` defaults to `{Required}` to mirror the usual "every declared property must be present"
/// contract; clear it explicitly for optional members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    /// Explicit store key. When blank the key is derived from the member name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub data_type: TypeDescriptor,
    #[serde(default = "default_options")]
    pub options: Vec<BindingOption>,
    /// Literal used when the store holds no value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Alternate key consulted when the store holds no value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lookup: Option<String>,
    #[serde(default)]
    pub parameter_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

fn default_options() -> Vec<BindingOption> {
    vec![BindingOption::Required]
}

impl MemberSpec {
    pub fn new(name: impl Into<String>, data_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            key: None,
            data_type,
            options: default_options(),
            default_value: None,
            default_lookup: None,
            parameter_count: 0,
            annotations: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Replaces the option set. Duplicates are dropped, first occurrence wins.
    pub fn with_options(mut self, options: impl IntoIterator<Item = BindingOption>) -> Self {
        self.options.clear();
        for option in options {
            if !self.options.contains(&option) {
                self.options.push(option);
            }
        }
        self
    }

    pub fn with_option(mut self, option: BindingOption) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    pub fn without_option(mut self, option: BindingOption) -> Self {
        self.options.retain(|existing| *existing != option);
        self
    }

    /// Shorthand for `with_options([])`.
    pub fn optional(self) -> Self {
        self.with_options([])
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_default_lookup(mut self, key: impl Into<String>) -> Self {
        self.default_lookup = Some(key.into());
        self
    }

    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Derives the bean-style property name of this member, if it is property-shaped.
    ///
    /// Getters (`getX`, `isX`, `get_x`, `is_x`) must take no parameters and setters (`setX`, `set_x`)
    /// exactly one. The remainder is decapitalized: `getDoorCount` yields `doorCount`, `getURL` yields
    /// `URL` (two leading capitals are kept as-is).
    ///
    /// # Returns
    /// `None` for members that do not follow the accessor naming convention.
    pub fn property_name(&self) -> Option<String> {
        let captures = ACCESSOR_NAME_REGEX.captures(&self.name)?;
        let prefix = captures.get(1)?.as_str();
        let snake = !captures.get(2)?.as_str().is_empty();
        let rest = captures.get(3)?.as_str();

        let expected_params = if prefix == "set" { 1 } else { 0 };
        if self.parameter_count != expected_params {
            return None;
        }
        if snake {
            return Some(rest.to_string());
        }
        if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        Some(decapitalize(rest))
    }

    pub fn is_property(&self) -> bool {
        self.property_name().is_some()
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.clone().next().is_some_and(|second| second.is_uppercase()) && first.is_uppercase() {
        return name.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}
