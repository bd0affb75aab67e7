use typedconf_types::{TreeHandle, print_tree};

use crate::{
    error::ConfigError,
    resolver::{SharedResolver, ValueResolver},
    value::Value,
};

/// Turns a `Null` result into [`ConfigError::RequiredKeyMissing`], with a dump of the tree.
pub struct RequiredResolver {
    inner: SharedResolver,
    tree: TreeHandle,
}

impl RequiredResolver {
    pub fn new(inner: SharedResolver, tree: TreeHandle) -> Self {
        Self { inner, tree }
    }
}

impl ValueResolver for RequiredResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let value = self.inner.resolve()?;
        if value.is_null() {
            return Err(ConfigError::RequiredKeyMissing {
                key: self.inner.key_to_lookup(),
                dump: print_tree(self.tree.as_ref()),
            });
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
