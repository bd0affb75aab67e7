use thiserror::Error;

/// Failures raised while building or resolving configuration proxies.
///
/// Variants fall in two classes. Schema errors ([`ConfigError::is_schema_error`]) are raised while a
/// proxy is being built and indicate a broken declaration; every other variant is raised by a
/// single `resolve()` call and reflects the current contents of the store.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid schema {type_name}, member '{member}': {reason}")]
    InvalidSchema { type_name: String, member: String, reason: String },

    /// A literal default that does not convert to the member type.
    #[error("invalid default value '{raw}' for key '{key}': {reason}")]
    InvalidDefault { key: String, raw: String, reason: String },

    #[error("cannot convert '{raw}' at key '{key}' to {target}")]
    Conversion { key: String, raw: String, target: String },

    #[error("required key '{key}' is missing from the configuration\n{dump}")]
    RequiredKeyMissing { key: String, dump: String },

    #[error("map at key '{key}' has no entry for required key '{map_key}'")]
    RequiredMapKeyMissing { key: String, map_key: String },

    #[error("constraint violation on {type_name}.{property} at key '{key}' (value {value}): {}", violations.join("; "))]
    ConstraintViolation {
        type_name: String,
        property: String,
        key: String,
        value: String,
        violations: Vec<String>,
    },

    #[error("no resolver factory accepts key '{key}' of type {data_type}")]
    RegistryLookup { key: String, data_type: String },

    #[error("{type_name} has no member '{member}'")]
    UnknownMember { type_name: String, member: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

impl ConfigError {
    pub(crate) fn schema(type_name: impl Into<String>, member: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            type_name: type_name.into(),
            member: member.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error describes a broken declaration rather than missing or bad data.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::InvalidSchema { .. } | Self::InvalidDefault { .. } | Self::RegistryLookup { .. })
    }

    /// Whether a required key or required map entry was absent.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::RequiredKeyMissing { .. } | Self::RequiredMapKeyMissing { .. })
    }
}
