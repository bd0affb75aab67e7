use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;
use typedconf_types::{Binding, BindingOption, TreeHandle};

use crate::{
    error::ConfigError,
    factory::FactoryContext,
    resolver::{SharedResolver, ValueResolver},
    value::Value,
};

struct LookupTarget {
    key: String,
    resolver: SharedResolver,
}

/// Indirection: the stored value names the key whose value is the real answer.
///
/// The resolver for the current target is remembered and reused until the stored target changes.
/// The `(key, resolver)` pair is swapped atomically, so concurrent readers always see a consistent
/// pair; a race can at worst build one redundant resolver.
pub struct LookupResolver {
    binding: Binding,
    tree: TreeHandle,
    context: Arc<FactoryContext>,
    current: ArcSwapOption<LookupTarget>,
}

impl LookupResolver {
    /// # Errors
    /// A schema error when `binding` does not carry [`BindingOption::LookupResult`].
    pub fn new(binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<Self, ConfigError> {
        if !binding.contains_option(BindingOption::LookupResult) {
            return Err(ConfigError::schema(
                binding.data_type().map(ToString::to_string).unwrap_or_default(),
                binding.key(),
                "lookup indirection requires the LookupResult option",
            ));
        }
        Ok(Self {
            binding: binding.without_option(BindingOption::LookupResult),
            tree: Arc::clone(tree),
            context: Arc::clone(context),
            current: ArcSwapOption::empty(),
        })
    }

    fn target_for(&self, key: &str) -> Result<SharedResolver, ConfigError> {
        if let Some(current) = self.current.load_full()
            && current.key == key
        {
            return Ok(Arc::clone(&current.resolver));
        }
        debug!(source = self.binding.key(), target = key, "retargeting lookup");
        let resolver = self
            .context
            .registry()
            .make_base(&self.binding.with_key(key), &self.tree, &self.context)?;
        self.current.store(Some(Arc::new(LookupTarget {
            key: key.to_string(),
            resolver: Arc::clone(&resolver),
        })));
        Ok(resolver)
    }
}

impl ValueResolver for LookupResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let target = self
            .tree
            .scalar(self.binding.key())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        match target {
            Some(key) => self.target_for(&key)?.resolve(),
            None => {
                self.current.store(None);
                Ok(Value::Null)
            }
        }
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        Err(ConfigError::InvalidDefault {
            key: self.binding.key().to_string(),
            raw: raw.to_string(),
            reason: "lookup results cannot have a default".to_string(),
        })
    }

    fn key_to_lookup(&self) -> String {
        self.binding.key().to_string()
    }
}
