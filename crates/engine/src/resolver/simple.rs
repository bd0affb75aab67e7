use std::sync::Arc;

use tracing::trace;
use typedconf_types::{Binding, BindingOption, ScalarKind, TreeHandle, TypeDescriptor};

use super::{ResolverFactory, SharedResolver, ValueResolver, ValueType, not_defaultable};
use crate::{convert::ValueConverter, error::ConfigError, factory::FactoryContext, value::Value};

/// Factory for one scalar kind, primitive or not.
///
/// The boolean factory additionally honors [`BindingOption::CheckKeyExists`], answering whether the
/// key is present instead of reading its value.
#[derive(Debug, Clone, Copy)]
pub struct ScalarResolverFactory {
    kind: ScalarKind,
}

impl ScalarResolverFactory {
    pub fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }
}

impl ResolverFactory for ScalarResolverFactory {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn can_resolve_for(&self, binding: &Binding) -> bool {
        binding.data_type().and_then(TypeDescriptor::scalar_kind) == Some(self.kind)
    }

    fn value_type(&self) -> ValueType {
        ValueType::Simple
    }

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        if self.kind == ScalarKind::Bool && binding.contains_option(BindingOption::CheckKeyExists) {
            return Ok(Arc::new(KeyExistsResolver {
                key: binding.key().to_string(),
                tree: Arc::clone(tree),
            }));
        }
        Ok(Arc::new(ConvertingResolver::new(binding, tree, context)))
    }
}

/// Factory for enum-typed members.
#[derive(Debug, Clone, Copy)]
pub struct EnumResolverFactory;

impl ResolverFactory for EnumResolverFactory {
    fn name(&self) -> &str {
        "enum"
    }

    fn can_resolve_for(&self, binding: &Binding) -> bool {
        matches!(binding.data_type(), Some(TypeDescriptor::Enum(_)))
    }

    fn value_type(&self) -> ValueType {
        ValueType::Simple
    }

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        Ok(Arc::new(ConvertingResolver::new(binding, tree, context)))
    }
}

/// Factory for members typed as the raw configuration tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeResolverFactory;

impl ResolverFactory for TreeResolverFactory {
    fn name(&self) -> &str {
        "tree"
    }

    fn can_resolve_for(&self, binding: &Binding) -> bool {
        matches!(binding.data_type(), Some(TypeDescriptor::Tree))
    }

    fn value_type(&self) -> ValueType {
        ValueType::Nested
    }

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, _context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        Ok(Arc::new(TreeResolver {
            key: binding.key().to_string(),
            tree: Arc::clone(tree),
        }))
    }
}

/// Reads one scalar and converts it to the declared type.
struct ConvertingResolver {
    key: String,
    target: TypeDescriptor,
    tree: TreeHandle,
    converter: Arc<dyn ValueConverter>,
}

impl ConvertingResolver {
    fn new(binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Self {
        Self {
            key: binding.key().to_string(),
            target: binding.data_type().cloned().unwrap_or_else(TypeDescriptor::string),
            tree: Arc::clone(tree),
            converter: Arc::clone(context.converter()),
        }
    }

    fn convert(&self, raw: &str) -> Result<Value, ConfigError> {
        // A blank enum label reads as unset; other blank text goes to the converter and fails there.
        if raw.trim().is_empty() && matches!(self.target, TypeDescriptor::Enum(_)) {
            return Ok(Value::Null);
        }
        self.converter
            .convert(raw, &self.target)
            .map_err(|_| ConfigError::Conversion {
                key: self.key.clone(),
                raw: raw.to_string(),
                target: self.target.to_string(),
            })
    }
}

impl ValueResolver for ConvertingResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        match self.tree.scalar(&self.key) {
            Some(raw) => self.convert(&raw),
            None => {
                trace!(key = %self.key, "no value stored");
                Ok(Value::Null)
            }
        }
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        self.convert(raw)
    }

    fn key_to_lookup(&self) -> String {
        self.key.clone()
    }
}

/// Answers whether a key or sub-tree exists, regardless of its value.
struct KeyExistsResolver {
    key: String,
    tree: TreeHandle,
}

impl ValueResolver for KeyExistsResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        Ok(Value::Bool(self.tree.contains_key(&self.key) || self.tree.sub_tree(&self.key).is_some()))
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        Err(not_defaultable(&self.key, raw, "key-exists"))
    }

    fn key_to_lookup(&self) -> String {
        self.key.clone()
    }
}

/// Hands out the tree itself, or the single sub-tree at its key.
struct TreeResolver {
    key: String,
    tree: TreeHandle,
}

impl ValueResolver for TreeResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        if self.key.is_empty() {
            return Ok(Value::Tree(Arc::clone(&self.tree)));
        }
        Ok(self.tree.sub_tree(&self.key).map_or(Value::Null, Value::Tree))
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        Err(not_defaultable(&self.key, raw, "tree"))
    }

    fn key_to_lookup(&self) -> String {
        self.key.clone()
    }
}
