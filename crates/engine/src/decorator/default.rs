use tracing::trace;

use crate::{
    error::ConfigError,
    resolver::{SharedResolver, ValueResolver},
    value::Value,
};

/// Falls back to a literal when the inner resolver yields `Null`.
///
/// The literal is converted once, when the decorator is built, so a bad default surfaces as a schema
/// error at proxy construction and never during `resolve`.
pub struct DefaultGivenValueResolver {
    inner: SharedResolver,
    fallback: Value,
}

impl DefaultGivenValueResolver {
    pub fn new(inner: SharedResolver, raw: &str) -> Result<Self, ConfigError> {
        let fallback = inner.convert_default_value(raw).map_err(|error| match error {
            ConfigError::InvalidDefault { .. } => error,
            other => ConfigError::InvalidDefault {
                key: inner.key_to_lookup(),
                raw: raw.to_string(),
                reason: other.to_string(),
            },
        })?;
        Ok(Self { inner, fallback })
    }
}

impl ValueResolver for DefaultGivenValueResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let value = self.inner.resolve()?;
        if value.is_null() {
            trace!(key = %self.inner.key_to_lookup(), fallback = %self.fallback, "using default value");
            return Ok(self.fallback.clone());
        }
        Ok(value)
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        self.inner.convert_default_value(raw)
    }

    fn key_to_lookup(&self) -> String {
        self.inner.key_to_lookup()
    }
}

/// Falls back to the value at another key when the inner resolver yields `Null`.
pub struct DefaultLookupResolver {
    inner: SharedResolver,
    fallback: SharedResolver,
}

impl DefaultLookupResolver {
    pub fn new(inner: SharedResolver, fallback: SharedResolver) -> Self {
        Self { inner, fallback }
    }
}

impl ValueResolver for DefaultLookupResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let value = self.inner.resolve()?;
        if value.is_null() {
            trace!(key = %self.inner.key_to_lookup(), fallback_key = %self.fallback.key_to_lookup(), "using default lookup");
            return self.fallback.resolve();
        }
        Ok(value)
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        self.inner.convert_default_value(raw)
    }

    fn key_to_lookup(&self) -> String {
        self.inner.key_to_lookup()
    }
}
