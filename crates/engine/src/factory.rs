//! Factory construction and the shared per-factory context.

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, trace};
use typedconf_types::{ChangeEvent, ChangeListener, SchemaSpec, TreeHandle};

use crate::{
    bus::InvalidationBus,
    convert::{StandardConverter, ValueConverter},
    error::ConfigError,
    proxy::{self, ConfigProxy},
    resolver::{ResolverFactory, ValueResolverRegistry},
    strategy::{
        CacheNestedProxies, CacheStrategy, ConstraintValidationStrategy, DefaultValueStrategy, KeyCombinationStrategy,
        MemberDefaultsStrategy, NoValidation, SmartKeyCombination, ValidationStrategy,
    },
    validate::ConstraintValidator,
};

/// Everything a factory's resolvers share: registry, strategies, converter and invalidation bus.
///
/// The context also listens to the stores its proxies are bound to and republishes after-phase
/// change events on the bus.
pub struct FactoryContext {
    registry: ValueResolverRegistry,
    cache_strategy: Arc<dyn CacheStrategy>,
    default_strategy: Arc<dyn DefaultValueStrategy>,
    validation_strategy: Arc<dyn ValidationStrategy>,
    key_strategy: Arc<dyn KeyCombinationStrategy>,
    converter: Arc<dyn ValueConverter>,
    bus: InvalidationBus,
    /// Names of schemas whose resolvers are known to build (or are being built).
    preflighted: Mutex<HashSet<String>>,
}

impl FactoryContext {
    pub fn registry(&self) -> &ValueResolverRegistry {
        &self.registry
    }

    pub fn cache_strategy(&self) -> &Arc<dyn CacheStrategy> {
        &self.cache_strategy
    }

    pub fn default_strategy(&self) -> &Arc<dyn DefaultValueStrategy> {
        &self.default_strategy
    }

    pub fn validation_strategy(&self) -> &Arc<dyn ValidationStrategy> {
        &self.validation_strategy
    }

    pub fn key_strategy(&self) -> &Arc<dyn KeyCombinationStrategy> {
        &self.key_strategy
    }

    pub fn converter(&self) -> &Arc<dyn ValueConverter> {
        &self.converter
    }

    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    /// Builds the resolvers of `schema` once and discards them, so that a broken nested schema fails
    /// the enclosing proxy at construction even when its sub-tree is absent.
    ///
    /// A schema is marked before it is built, which also stops recursive schemas from recursing.
    pub(crate) fn preflight(self: &Arc<Self>, schema: &Arc<SchemaSpec>, tree: &TreeHandle) -> Result<(), ConfigError> {
        let first_visit = self.preflighted.lock().insert(schema.name.clone());
        if !first_visit {
            return Ok(());
        }
        trace!(schema = %schema.name, "preflighting nested schema");
        if let Err(error) = proxy::build_resolvers(schema, tree, self) {
            self.preflighted.lock().remove(&schema.name);
            return Err(error);
        }
        Ok(())
    }
}

impl ChangeListener for FactoryContext {
    fn configuration_changed(&self, event: &ChangeEvent) {
        if !event.is_after() {
            return;
        }
        debug!(kind = ?event.kind, key = %event.key, "store changed");
        self.bus.publish();
    }
}

/// Builds live configuration proxies.
///
/// ```rust
/// use std::sync::Arc;
///
/// use typedconf_engine::ConfigProxyFactory;
/// use typedconf_store::MemoryTree;
/// use typedconf_types::{MemberSpec, ScalarKind, SchemaSpec, TypeDescriptor};
///
/// let schema = SchemaSpec::new("Car")
///     .with_member(MemberSpec::new("doors", TypeDescriptor::scalar(ScalarKind::I32)).with_default_value("4"))
///     .shared();
/// let tree = MemoryTree::new("car");
///
/// let factory = ConfigProxyFactory::builder().build();
/// let car = factory.make_proxy(&schema, &tree.handle())?;
/// assert_eq!(car.get_as::<i32>("doors")?, 4);
///
/// tree.set_property("doors", "2")?;
/// assert_eq!(car.get_as::<i32>("doors")?, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct ConfigProxyFactory {
    context: Arc<FactoryContext>,
}

impl ConfigProxyFactory {
    pub fn builder() -> ConfigProxyFactoryBuilder {
        ConfigProxyFactoryBuilder::default()
    }

    pub fn context(&self) -> &Arc<FactoryContext> {
        &self.context
    }

    /// Binds `schema` to `tree` and subscribes this factory to the tree's change events.
    ///
    /// # Errors
    /// Any schema error in `schema` or in the schemas it nests.
    pub fn make_proxy(&self, schema: &Arc<SchemaSpec>, tree: &TreeHandle) -> Result<ConfigProxy, ConfigError> {
        tree.subscribe(Arc::clone(&self.context) as Arc<dyn ChangeListener>);
        let proxy = proxy::build_proxy(schema, tree, &self.context)?;
        debug!(schema = %schema.name, members = schema.members.len(), "built configuration proxy");
        Ok(proxy)
    }

    /// Binds the schema of `T` to `tree` and wraps the proxy in the typed adapter.
    pub fn make<T: ConfigSchema>(&self, tree: &TreeHandle) -> Result<T, ConfigError> {
        let proxy = self.make_proxy(&T::schema(), tree)?;
        T::from_proxy(proxy)
    }

    /// Drops every cached value, as if the store had changed.
    pub fn invalidate_all(&self) {
        self.context.bus.publish();
    }
}

/// A hand-written typed view over a [`ConfigProxy`].
pub trait ConfigSchema: Sized {
    fn schema() -> Arc<SchemaSpec>;

    fn from_proxy(proxy: ConfigProxy) -> Result<Self, ConfigError>;
}

/// Configuration surface of [`ConfigProxyFactory`].
///
/// Defaults: nested-only caching, member defaults, no validation, smart key combination and the
/// [`StandardConverter`].
pub struct ConfigProxyFactoryBuilder {
    user_factories: Vec<Arc<dyn ResolverFactory>>,
    cache_strategy: Arc<dyn CacheStrategy>,
    default_strategy: Arc<dyn DefaultValueStrategy>,
    validation_strategy: Arc<dyn ValidationStrategy>,
    key_strategy: Arc<dyn KeyCombinationStrategy>,
    converter: Arc<dyn ValueConverter>,
}

impl Default for ConfigProxyFactoryBuilder {
    fn default() -> Self {
        Self {
            user_factories: Vec::new(),
            cache_strategy: Arc::new(CacheNestedProxies),
            default_strategy: Arc::new(MemberDefaultsStrategy),
            validation_strategy: Arc::new(NoValidation),
            key_strategy: Arc::new(SmartKeyCombination),
            converter: Arc::new(StandardConverter),
        }
    }
}

impl ConfigProxyFactoryBuilder {
    /// Registers a factory consulted before every built-in one. Later registrations come after
    /// earlier ones.
    pub fn add_factory(mut self, factory: impl ResolverFactory + 'static) -> Self {
        self.user_factories.push(Arc::new(factory));
        self
    }

    pub fn cache_strategy(mut self, strategy: impl CacheStrategy + 'static) -> Self {
        self.cache_strategy = Arc::new(strategy);
        self
    }

    pub fn default_value_strategy(mut self, strategy: impl DefaultValueStrategy + 'static) -> Self {
        self.default_strategy = Arc::new(strategy);
        self
    }

    pub fn validation_strategy(mut self, strategy: impl ValidationStrategy + 'static) -> Self {
        self.validation_strategy = Arc::new(strategy);
        self
    }

    /// Shorthand for a [`ConstraintValidationStrategy`] over `validator`.
    pub fn validator(self, validator: impl ConstraintValidator + 'static) -> Self {
        self.validation_strategy(ConstraintValidationStrategy::new(Arc::new(validator)))
    }

    pub fn key_strategy(mut self, strategy: impl KeyCombinationStrategy + 'static) -> Self {
        self.key_strategy = Arc::new(strategy);
        self
    }

    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    pub fn build(self) -> ConfigProxyFactory {
        ConfigProxyFactory {
            context: Arc::new(FactoryContext {
                registry: ValueResolverRegistry::new(self.user_factories),
                cache_strategy: self.cache_strategy,
                default_strategy: self.default_strategy,
                validation_strategy: self.validation_strategy,
                key_strategy: self.key_strategy,
                converter: self.converter,
                bus: InvalidationBus::new(),
                preflighted: Mutex::new(HashSet::new()),
            }),
        }
    }
}
