use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{trace, warn};
use typedconf_types::{Binding, TreeHandle, TypeDescriptor};

use super::{ResolverFactory, SharedResolver, ValueResolver, ValueType, not_defaultable};
use crate::{
    error::ConfigError,
    factory::FactoryContext,
    value::{ConfigMap, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape {
    /// Store order, duplicates kept.
    List,
    /// Store order of first occurrence, duplicates dropped.
    Set,
    /// Natural order, duplicates dropped.
    SortedSet,
    /// Elements keyed by one of their own properties.
    Map,
}

impl ContainerShape {
    fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "sorted_set",
            Self::Map => "map",
        }
    }

    fn accepts(&self, data_type: &TypeDescriptor) -> bool {
        matches!(
            (self, data_type),
            (Self::List, TypeDescriptor::List(_))
                | (Self::Set, TypeDescriptor::Set(_))
                | (Self::SortedSet, TypeDescriptor::SortedSet(_))
                | (Self::Map, TypeDescriptor::Map { .. })
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContainerResolverFactory {
    shape: ContainerShape,
}

impl ContainerResolverFactory {
    pub fn new(shape: ContainerShape) -> Self {
        Self { shape }
    }
}

impl ResolverFactory for ContainerResolverFactory {
    fn name(&self) -> &str {
        self.shape.name()
    }

    fn can_resolve_for(&self, binding: &Binding) -> bool {
        binding.data_type().is_some_and(|data_type| self.shape.accepts(data_type))
    }

    fn value_type(&self) -> ValueType {
        ValueType::Container
    }

    fn make_for(&self, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<SharedResolver, ConfigError> {
        Ok(Arc::new(ContainerResolver::new(self.shape, binding, tree, context)?))
    }
}

/// How each repeated node turns into an element.
enum ElementPlan {
    /// Convert each repeated value with the element type's own resolver.
    Simple(SharedResolver),
    /// Bind a fresh element resolver to each repeated sub-tree.
    Nested {
        factory: Arc<dyn ResolverFactory>,
        binding: Binding,
    },
}

struct MapPlan {
    property: String,
    required: bool,
    key_type: TypeDescriptor,
}

struct ContainerResolver {
    shape: ContainerShape,
    key: String,
    tree: TreeHandle,
    context: Arc<FactoryContext>,
    element: ElementPlan,
    map: Option<MapPlan>,
}

impl ContainerResolver {
    /// Classifies the element type once so that every `resolve` only walks the store.
    ///
    /// # Errors
    /// Schema errors for containers of containers, maps without a `MapKey` annotation, maps over
    /// anything but schemas, and map keys naming a property the element schema lacks. Element types
    /// no factory accepts fail with [`ConfigError::RegistryLookup`].
    fn new(shape: ContainerShape, binding: &Binding, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<Self, ConfigError> {
        let data_type = binding.data_type().cloned().ok_or_else(|| ConfigError::RegistryLookup {
            key: binding.key().to_string(),
            data_type: "<untyped>".to_string(),
        })?;
        let invalid = |reason: String| ConfigError::schema(data_type.to_string(), binding.key(), reason);

        let element_type = data_type
            .contained_type()
            .cloned()
            .ok_or_else(|| invalid("not a container type".to_string()))?;
        if element_type.is_container() {
            return Err(invalid(format!("containers of containers are not supported ({element_type})")));
        }

        let element_binding = Binding::for_key_and_type(binding.key(), element_type.clone());
        let registry = context.registry();
        let element = match registry.value_type_of(&element_binding)? {
            ValueType::Simple => ElementPlan::Simple(registry.make_base(&element_binding, tree, context)?),
            ValueType::Nested => {
                if let TypeDescriptor::Schema(schema) = &element_type {
                    context.preflight(schema, tree)?;
                }
                ElementPlan::Nested {
                    factory: Arc::clone(registry.factory_for(&element_binding)?),
                    binding: element_binding,
                }
            }
            ValueType::Container => return Err(invalid(format!("containers of containers are not supported ({element_type})"))),
        };

        let map = match shape {
            ContainerShape::Map => {
                let (property, required) = binding
                    .map_key()
                    .ok_or_else(|| invalid("map containers require a MapKey annotation".to_string()))?;
                let TypeDescriptor::Schema(schema) = &element_type else {
                    return Err(invalid(format!("map elements must be nested schemas, found {element_type}")));
                };
                if schema.member_by_property(property).is_none() {
                    return Err(invalid(format!("element schema {} has no property '{property}'", schema.name)));
                }
                let key_type = data_type.map_key_type().cloned().unwrap_or_else(TypeDescriptor::string);
                if !matches!(key_type, TypeDescriptor::Scalar { .. } | TypeDescriptor::Enum(_)) {
                    return Err(invalid(format!("map keys must be scalars, found {key_type}")));
                }
                Some(MapPlan {
                    property: property.to_string(),
                    required,
                    key_type,
                })
            }
            _ => None,
        };

        Ok(Self {
            shape,
            key: binding.key().to_string(),
            tree: Arc::clone(tree),
            context: Arc::clone(context),
            element,
            map,
        })
    }

    fn elements(&self) -> Result<Vec<Value>, ConfigError> {
        match &self.element {
            ElementPlan::Simple(resolver) => self
                .tree
                .repeated_scalars(&self.key)
                .iter()
                .map(|raw| resolver.convert_default_value(raw))
                .collect(),
            ElementPlan::Nested { factory, binding } => {
                let mut elements = Vec::new();
                for sub_tree in self.tree.sub_trees(&self.key) {
                    let element_binding = binding.with_key(sub_tree.relative_key());
                    let resolver = factory.make_for(&element_binding, &self.tree, &self.context)?;
                    elements.push(resolver.resolve()?);
                }
                Ok(elements)
            }
        }
    }

    fn build_map(&self, plan: &MapPlan, elements: Vec<Value>) -> Result<ConfigMap, ConfigError> {
        let mut entries = IndexMap::with_capacity(elements.len());
        for element in elements {
            let Some(proxy) = element.as_proxy() else {
                return Err(ConfigError::schema(
                    plan.key_type.to_string(),
                    &self.key,
                    format!("map element of kind {} cannot provide a key", element.kind_name()),
                ));
            };
            let projected = proxy.get(&plan.property)?;
            if projected.is_null() {
                warn!(key = %self.key, property = %plan.property, "skipping map element without a key");
                continue;
            }
            let text = projected.to_string();
            let map_key = self
                .context
                .converter()
                .convert(&text, &plan.key_type)
                .map_err(|_| ConfigError::Conversion {
                    key: self.key.clone(),
                    raw: text.clone(),
                    target: plan.key_type.to_string(),
                })?;
            if entries.contains_key(&map_key) {
                warn!(key = %self.key, map_key = %map_key, "duplicate map key, keeping the first element");
                continue;
            }
            entries.insert(map_key, element);
        }
        Ok(ConfigMap::new(self.key.clone(), plan.required, entries))
    }
}

impl ValueResolver for ContainerResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let elements = self.elements()?;
        trace!(key = %self.key, shape = self.shape.name(), elements = elements.len(), "resolved container");
        Ok(match self.shape {
            ContainerShape::List => Value::List(Arc::from(elements)),
            ContainerShape::Set => {
                let unique: IndexSet<Value> = elements.into_iter().collect();
                Value::Set(unique.into_iter().collect())
            }
            ContainerShape::SortedSet => {
                let mut sorted = elements;
                sorted.sort();
                sorted.dedup();
                Value::SortedSet(Arc::from(sorted))
            }
            ContainerShape::Map => match &self.map {
                Some(plan) => Value::Map(self.build_map(plan, elements)?),
                None => Value::Map(ConfigMap::new(self.key.clone(), true, IndexMap::new())),
            },
        })
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        Err(not_defaultable(&self.key, raw, "container"))
    }

    fn key_to_lookup(&self) -> String {
        self.key.clone()
    }
}
