use std::sync::Arc;

use typedconf_types::BindingOption;

use super::{DefaultValueStrategy, MemberTarget};
use crate::{
    decorator::{DefaultGivenValueResolver, DefaultLookupResolver},
    error::ConfigError,
    factory::FactoryContext,
    resolver::{SharedResolver, ValueType},
};

/// Applies the member's `default_lookup` and `default_value`, in that order.
///
/// Blank defaults are ignored. A literal default is only legal on simple members. The lookup key is
/// combined with the schema's base key like any member key and resolved with the member's own shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberDefaultsStrategy;

impl DefaultValueStrategy for MemberDefaultsStrategy {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        let mut resolver = resolver;

        if let Some(lookup) = target.member.default_lookup.as_deref().filter(|key| !key.trim().is_empty()) {
            let fallback_key = context
                .key_strategy()
                .combine(&target.schema.base_key, lookup, target.tree.as_ref());
            let fallback_binding = target
                .binding
                .with_key(fallback_key)
                .without_option(BindingOption::Required);
            let fallback = context.registry().make_base(&fallback_binding, target.tree, context)?;
            resolver = Arc::new(DefaultLookupResolver::new(resolver, fallback));
        }

        if let Some(raw) = target.member.default_value.as_deref().filter(|raw| !raw.trim().is_empty()) {
            if target.value_type != ValueType::Simple {
                return Err(ConfigError::schema(
                    &target.schema.name,
                    &target.member.name,
                    format!("default values are only supported for simple members, not {}", target.member.data_type),
                ));
            }
            resolver = Arc::new(DefaultGivenValueResolver::new(resolver, raw)?);
        }

        Ok(resolver)
    }
}
