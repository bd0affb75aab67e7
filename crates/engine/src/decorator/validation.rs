use std::sync::Arc;

use typedconf_types::ConstraintDescriptor;

use crate::{
    error::ConfigError,
    resolver::{SharedResolver, ValueResolver},
    validate::ConstraintValidator,
    value::Value,
};

/// Runs the constraint validator over every resolved value.
pub struct ValidatingResolver {
    inner: SharedResolver,
    validator: Arc<dyn ConstraintValidator>,
    type_name: String,
    property: String,
    constraints: Vec<ConstraintDescriptor>,
}

impl ValidatingResolver {
    pub fn new(
        inner: SharedResolver,
        validator: Arc<dyn ConstraintValidator>,
        type_name: impl Into<String>,
        property: impl Into<String>,
        constraints: Vec<ConstraintDescriptor>,
    ) -> Self {
        Self {
            inner,
            validator,
            type_name: type_name.into(),
            property: property.into(),
            constraints,
        }
    }
}

impl ValueResolver for ValidatingResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let value = self.inner.resolve()?;
        let violations = self
            .validator
            .validate(&self.type_name, &self.property, &self.constraints, &value);
        if violations.is_empty() {
            return Ok(value);
        }
        Err(ConfigError::ConstraintViolation {
            type_name: self.type_name.clone(),
            property: self.property.clone(),
            key: self.inner.key_to_lookup(),
            value: value.to_string(),
            violations: violations
                .into_iter()
                .map(|violation| format!("{}: {}", violation.constraint, violation.message))
                .collect(),
        })
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        self.inner.convert_default_value(raw)
    }

    fn key_to_lookup(&self) -> String {
        self.inner.key_to_lookup()
    }
}
