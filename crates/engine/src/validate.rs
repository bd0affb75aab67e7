//! Contract of the external constraint validator.

use typedconf_types::ConstraintDescriptor;

use crate::value::Value;

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
}

impl Violation {
    pub fn new(constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

/// Evaluates the constraints declared on a property against a resolved value.
///
/// The engine only decides *when* to call the validator; evaluating constraints is entirely up to
/// the implementation.
pub trait ConstraintValidator: Send + Sync {
    fn validate(&self, type_name: &str, property: &str, constraints: &[ConstraintDescriptor], value: &Value) -> Vec<Violation>;
}

impl<F> ConstraintValidator for F
where
    F: Fn(&str, &str, &[ConstraintDescriptor], &Value) -> Vec<Violation> + Send + Sync,
{
    fn validate(&self, type_name: &str, property: &str, constraints: &[ConstraintDescriptor], value: &Value) -> Vec<Violation> {
        self(type_name, property, constraints, value)
    }
}
