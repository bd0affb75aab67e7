//! Per-member resolver assembly.

use std::sync::Arc;

use tracing::trace;
use typedconf_types::{Binding, BindingOption, MemberSpec, ScalarKind, SchemaSpec, TreeHandle};

use crate::{
    decorator::{LookupResolver, RequiredResolver},
    error::ConfigError,
    factory::FactoryContext,
    resolver::SharedResolver,
    strategy::MemberTarget,
};

/// Builds the fully decorated resolver for one member.
///
/// # Arguments
/// * `schema` - The schema declaring the member; supplies the base key and diagnostics name.
/// * `member` - The member to bind.
/// * `tree` - The tree the enclosing proxy is bound to.
/// * `context` - Registry, strategies and bus of the owning factory.
///
/// # Returns
/// The resolver stack caching → validation → required → defaults → base.
pub(crate) fn resolver_for_member(
    schema: &SchemaSpec,
    member: &MemberSpec,
    tree: &TreeHandle,
    context: &Arc<FactoryContext>,
) -> Result<SharedResolver, ConfigError> {
    let local = local_key(schema, member)?;
    let key = context.key_strategy().combine(&schema.base_key, &local, tree.as_ref());
    let binding = Binding::for_key_and_type(key, member.data_type.clone())
        .with_options(member.options.iter().copied())
        .with_annotations(member.annotations.iter().cloned());
    check_option_combinations(schema, member, &binding)?;

    let value_type = context.registry().value_type_of(&binding)?;
    trace!(schema = %schema.name, member = %member.name, key = binding.key(), ?value_type, "binding member");
    let target = MemberTarget {
        schema,
        member,
        binding: &binding,
        value_type,
        tree,
    };

    let mut resolver: SharedResolver = if binding.contains_option(BindingOption::LookupResult) {
        Arc::new(LookupResolver::new(&binding, tree, context)?)
    } else {
        context.registry().make_base(&binding, tree, context)?
    };
    resolver = context.default_strategy().decorate(resolver, &target, context)?;
    if binding.contains_option(BindingOption::Required) || member.data_type.is_primitive() {
        resolver = Arc::new(RequiredResolver::new(resolver, Arc::clone(tree)));
    }
    resolver = context.validation_strategy().decorate(resolver, &target, context)?;
    Ok(context.cache_strategy().decorate(resolver, &target, context))
}

/// The member's key before the schema base key is applied.
fn local_key(schema: &SchemaSpec, member: &MemberSpec) -> Result<String, ConfigError> {
    if let Some(key) = member.key.as_deref().filter(|key| !key.trim().is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(property) = member.property_name() {
        return Ok(property);
    }
    if member.parameter_count == 0 {
        return Ok(member.name.clone());
    }
    Err(ConfigError::schema(
        &schema.name,
        &member.name,
        format!("takes {} parameters; only property accessors and parameterless members can be bound", member.parameter_count),
    ))
}

fn check_option_combinations(schema: &SchemaSpec, member: &MemberSpec, binding: &Binding) -> Result<(), ConfigError> {
    let invalid = |reason: &str| Err(ConfigError::schema(&schema.name, &member.name, reason));

    if binding.contains_option(BindingOption::CheckKeyExists) && member.data_type.scalar_kind() != Some(ScalarKind::Bool) {
        return invalid("CheckKeyExists is only supported on boolean members");
    }
    if binding.contains_option(BindingOption::LookupResult) {
        if member.default_value.is_some() || member.default_lookup.is_some() {
            return invalid("LookupResult cannot be combined with a default");
        }
        if binding.contains_option(BindingOption::Required) || member.data_type.is_primitive() {
            return invalid("LookupResult cannot be combined with Required or a primitive type");
        }
    }
    Ok(())
}
