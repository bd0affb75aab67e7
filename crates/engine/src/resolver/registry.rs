use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;
use typedconf_types::{Binding, ScalarKind, TreeHandle};

use super::{
    ContainerResolverFactory, ContainerShape, EnumResolverFactory, NestedResolverFactory, ResolverFactory, ScalarResolverFactory,
    SharedResolver, TreeResolverFactory, ValueType,
};
use crate::{error::ConfigError, factory::FactoryContext};

static BUILT_IN_FACTORIES: Lazy<Vec<Arc<dyn ResolverFactory>>> = Lazy::new(|| {
    vec![
        Arc::new(ScalarResolverFactory::new(ScalarKind::Bool)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::String)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::I32)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::I64)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::I8)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::I16)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::F32)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::F64)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::BigInteger)),
        Arc::new(ScalarResolverFactory::new(ScalarKind::BigDecimal)),
        Arc::new(EnumResolverFactory),
        Arc::new(TreeResolverFactory),
        Arc::new(ContainerResolverFactory::new(ContainerShape::List)),
        Arc::new(ContainerResolverFactory::new(ContainerShape::Set)),
        Arc::new(ContainerResolverFactory::new(ContainerShape::SortedSet)),
        Arc::new(ContainerResolverFactory::new(ContainerShape::Map)),
        Arc::new(NestedResolverFactory),
    ]
});

/// Ordered set of resolver factories.
///
/// User factories are consulted before the built-in ones, so they can take over any type,
/// including the scalars.
#[derive(Clone, Default)]
pub struct ValueResolverRegistry {
    user_factories: Vec<Arc<dyn ResolverFactory>>,
}

impl ValueResolverRegistry {
    pub fn new(user_factories: Vec<Arc<dyn ResolverFactory>>) -> Self {
        Self { user_factories }
    }

    pub fn factories(&self) -> impl Iterator<Item = &Arc<dyn ResolverFactory>> {
        self.user_factories.iter().chain(BUILT_IN_FACTORIES.iter())
    }

    /// The first factory accepting `binding`.
    ///
    /// # Errors
    /// [`ConfigError::RegistryLookup`] when no factory accepts the binding.
    pub fn factory_for(&self, binding: &Binding) -> Result<&Arc<dyn ResolverFactory>, ConfigError> {
        self.factories()
            .find(|factory| factory.can_resolve_for(binding))
            .ok_or_else(|| ConfigError::RegistryLookup {
                key: binding.key().to_string(),
                data_type: binding
                    .data_type()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<untyped>".to_string()),
            })
    }

    pub fn value_type_of(&self, binding: &Binding) -> Result<ValueType, ConfigError> {
        self.factory_for(binding).map(|factory| factory.value_type())
    }

    /// Builds the undecorated resolver for `binding`.
    pub fn make_base(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        let factory = self.factory_for(binding)?;
        debug!(key = binding.key(), factory = factory.name(), value_type = ?factory.value_type(), "selected resolver factory");
        factory.make_for(binding, tree, context)
    }
}

impl std::fmt::Debug for ValueResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories().map(|factory| factory.name())).finish()
    }
}
