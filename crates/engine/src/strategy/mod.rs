//! Pluggable policies applied while building member resolvers.
//!
//! A factory selects one strategy of each kind when it is built. Strategies are pure: given the
//! resolver built so far and the member being bound, they return the (possibly) decorated resolver.

mod cache;
mod defaults;
mod keys;
mod validation;

use std::sync::Arc;

pub use cache::{CacheEverythingForever, CacheNestedProxies, CacheNothing};
pub use defaults::MemberDefaultsStrategy;
pub use keys::{DelimitedKeyCombination, SmartKeyCombination, combine_delimited};
use typedconf_types::{Binding, ConfigTree, MemberSpec, SchemaSpec, TreeHandle};
pub use validation::{ConstraintValidationStrategy, NoValidation};

use crate::{
    error::ConfigError,
    factory::FactoryContext,
    resolver::{SharedResolver, ValueType},
};

/// The member currently being bound.
#[derive(Clone, Copy)]
pub struct MemberTarget<'a> {
    pub schema: &'a SchemaSpec,
    pub member: &'a MemberSpec,
    pub binding: &'a Binding,
    pub value_type: ValueType,
    pub tree: &'a TreeHandle,
}

pub trait CacheStrategy: Send + Sync {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, context: &Arc<FactoryContext>) -> SharedResolver;
}

pub trait DefaultValueStrategy: Send + Sync {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError>;
}

pub trait ValidationStrategy: Send + Sync {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError>;
}

/// Joins a schema's base key with a member's local key.
pub trait KeyCombinationStrategy: Send + Sync {
    fn combine(&self, base: &str, local: &str, tree: &dyn ConfigTree) -> String;
}
