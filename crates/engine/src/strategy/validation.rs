use std::sync::Arc;

use super::{MemberTarget, ValidationStrategy};
use crate::{
    decorator::ValidatingResolver, error::ConfigError, factory::FactoryContext, resolver::SharedResolver, validate::ConstraintValidator,
};

/// Leaves resolvers undecorated. Constraint annotations are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl ValidationStrategy for NoValidation {
    fn decorate(&self, resolver: SharedResolver, _target: &MemberTarget<'_>, _context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        Ok(resolver)
    }
}

/// Validates property-shaped members that carry `Constraint` annotations.
pub struct ConstraintValidationStrategy {
    validator: Arc<dyn ConstraintValidator>,
}

impl ConstraintValidationStrategy {
    pub fn new(validator: Arc<dyn ConstraintValidator>) -> Self {
        Self { validator }
    }
}

impl ValidationStrategy for ConstraintValidationStrategy {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, _context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        let constraints: Vec<_> = target.binding.constraints().cloned().collect();
        if constraints.is_empty() {
            return Ok(resolver);
        }
        let Some(property) = target.member.property_name() else {
            return Err(ConfigError::schema(
                &target.schema.name,
                &target.member.name,
                "constraints can only be declared on property accessors",
            ));
        };
        Ok(Arc::new(ValidatingResolver::new(
            resolver,
            Arc::clone(&self.validator),
            &target.schema.name,
            property,
            constraints,
        )))
    }
}
