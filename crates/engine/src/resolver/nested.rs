use std::sync::Arc;

use typedconf_types::{Binding, SchemaSpec, TreeHandle, TypeDescriptor};

use super::{ResolverFactory, SharedResolver, ValueResolver, ValueType, not_defaultable};
use crate::{error::ConfigError, factory::FactoryContext, proxy, value::Value};

/// Binds another schema to the sub-tree at a key. Consulted last, after every other built-in.
///
/// Only `Schema` types are accepted, so a type no factory understands misses the registry and fails
/// with [`ConfigError::RegistryLookup`] while the proxy is built, including as a container element.
#[derive(Debug, Clone, Copy)]
pub struct NestedResolverFactory;

impl ResolverFactory for NestedResolverFactory {
    fn name(&self) -> &str {
        "nested"
    }

    fn can_resolve_for(&self, binding: &Binding) -> bool {
        matches!(binding.data_type(), Some(TypeDescriptor::Schema(_)))
    }

    fn value_type(&self) -> ValueType {
        ValueType::Nested
    }

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        let Some(TypeDescriptor::Schema(schema)) = binding.data_type() else {
            return Err(ConfigError::RegistryLookup {
                key: binding.key().to_string(),
                data_type: binding.data_type().map(ToString::to_string).unwrap_or_default(),
            });
        };
        context.preflight(schema, tree)?;
        Ok(Arc::new(NestedResolver {
            key: binding.key().to_string(),
            schema: Arc::clone(schema),
            tree: Arc::clone(tree),
            context: Arc::clone(context),
        }))
    }
}

/// Builds a proxy over the sub-tree at `key` on every call, or `Null` when there is no single
/// sub-tree there.
struct NestedResolver {
    key: String,
    schema: Arc<SchemaSpec>,
    tree: TreeHandle,
    context: Arc<FactoryContext>,
}

impl ValueResolver for NestedResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let sub_tree = if self.key.is_empty() {
            Some(Arc::clone(&self.tree))
        } else {
            self.tree.sub_tree(&self.key)
        };
        match sub_tree {
            Some(sub_tree) => proxy::build_proxy(&self.schema, &sub_tree, &self.context).map(Value::Proxy),
            None => Ok(Value::Null),
        }
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        Err(not_defaultable(&self.key, raw, "nested"))
    }

    fn key_to_lookup(&self) -> String {
        self.key.clone()
    }
}
