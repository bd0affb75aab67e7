//! Value resolvers and the factories that build them.
//!
//! Modules:
//! - `registry`: ordered factory lookup (user factories first, then built-ins)
//! - `simple`: scalar, enum, key-exists and raw-tree accessors
//! - `container`: list, set, sorted-set and map accessors over repeated nodes
//! - `nested`: accessor building a proxy for another schema over a sub-tree

mod container;
mod nested;
mod registry;
mod simple;

use std::sync::Arc;

pub use container::{ContainerResolverFactory, ContainerShape};
pub use nested::NestedResolverFactory;
pub use registry::ValueResolverRegistry;
pub use simple::{EnumResolverFactory, ScalarResolverFactory, TreeResolverFactory};
use typedconf_types::{Binding, TreeHandle};

use crate::{error::ConfigError, factory::FactoryContext, value::Value};

/// Shape of the value a binding resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// A leaf converted from text.
    Simple,
    /// A whole sub-tree, viewed as another schema or as a raw tree.
    Nested,
    /// A collection over repeated nodes.
    Container,
}

/// Produces the value of one binding. Callable any number of times.
pub trait ValueResolver: Send + Sync {
    fn resolve(&self) -> Result<Value, ConfigError>;

    /// Converts a literal default the way a stored value would be converted.
    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError>;

    /// The store key this resolver reads.
    fn key_to_lookup(&self) -> String;
}

pub type SharedResolver = Arc<dyn ValueResolver>;

/// Builds base resolvers for the bindings it accepts.
///
/// Factories are stateless and consulted in registration order; the first one whose
/// `can_resolve_for` returns true builds the resolver and decides the binding's [`ValueType`].
pub trait ResolverFactory: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    fn can_resolve_for(&self, binding: &Binding) -> bool;

    fn value_type(&self) -> ValueType;

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError>;
}

/// Error for resolvers whose values cannot come from a literal.
pub(crate) fn not_defaultable(binding_key: &str, raw: &str, what: &str) -> ConfigError {
    ConfigError::InvalidDefault {
        key: binding_key.to_string(),
        raw: raw.to_string(),
        reason: format!("{what} values cannot have a default"),
    }
}
