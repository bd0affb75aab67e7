//! Schema proxies: a schema bound to a tree, exposed member by member.

mod pipeline;

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::IndexMap;
use typedconf_types::{SchemaSpec, TreeHandle};

use crate::{error::ConfigError, factory::FactoryContext, resolver::SharedResolver, value::Value};

const HASH_SEED: u64 = 2711;
const HASH_MULTIPLIER: u64 = 2789;

/// A live, typed view of one schema over one (sub-)tree.
///
/// Every member maps to a fully decorated resolver built when the proxy was built; `get` simply
/// dispatches to it. Cloning a proxy shares its resolvers and caches.
#[derive(Clone)]
pub struct ConfigProxy {
    inner: Arc<ProxyInner>,
}

struct ProxyInner {
    schema: Arc<SchemaSpec>,
    tree: TreeHandle,
    resolvers: IndexMap<String, SharedResolver>,
}

impl ConfigProxy {
    pub fn schema(&self) -> &Arc<SchemaSpec> {
        &self.inner.schema
    }

    pub fn tree(&self) -> &TreeHandle {
        &self.inner.tree
    }

    /// Member names in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.inner.resolvers.keys().map(String::as_str)
    }

    /// Resolves a member by name, or by its derived property name (`city` for `getCity`).
    pub fn get(&self, member: &str) -> Result<Value, ConfigError> {
        self.resolver(member)?.resolve()
    }

    /// Resolves a member and extracts it as `T`.
    pub fn get_as<T>(&self, member: &str) -> Result<T, ConfigError>
    where
        T: TryFrom<Value, Error = ConfigError>,
    {
        T::try_from(self.get(member)?)
    }

    /// Like [`ConfigProxy::get_as`], mapping `Null` to `None`.
    pub fn get_opt<T>(&self, member: &str) -> Result<Option<T>, ConfigError>
    where
        T: TryFrom<Value, Error = ConfigError>,
    {
        match self.get(member)? {
            Value::Null => Ok(None),
            value => T::try_from(value).map(Some),
        }
    }

    /// Folds every member value, then the schema name, into one hash.
    ///
    /// # Errors
    /// The first error raised while resolving a member.
    pub fn hash_code(&self) -> Result<u64, ConfigError> {
        let mut hash = HASH_SEED;
        for resolver in self.inner.resolvers.values() {
            hash = hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(resolver.resolve()?.hash_value());
        }
        let mut hasher = DefaultHasher::new();
        self.inner.schema.name.hash(&mut hasher);
        Ok(hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(hasher.finish()))
    }

    /// Two proxies are equal when they bind the same schema and hash alike.
    pub fn equals(&self, other: &ConfigProxy) -> Result<bool, ConfigError> {
        if self.inner.schema.name != other.inner.schema.name {
            return Ok(false);
        }
        Ok(self.hash_code()? == other.hash_code()?)
    }

    fn resolver(&self, member: &str) -> Result<&SharedResolver, ConfigError> {
        if let Some(resolver) = self.inner.resolvers.get(member) {
            return Ok(resolver);
        }
        self.inner
            .schema
            .member_by_property(member)
            .and_then(|spec| self.inner.resolvers.get(&spec.name))
            .ok_or_else(|| ConfigError::UnknownMember {
                type_name: self.inner.schema.name.clone(),
                member: member.to_string(),
            })
    }
}

impl fmt::Display for ConfigProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.inner.schema.name)?;
        for (index, (member, resolver)) in self.inner.resolvers.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            match resolver.resolve() {
                Ok(value) => write!(f, "{member}={value}")?,
                Err(error) => write!(f, "{member}=<error: {error}>")?,
            }
        }
        f.write_str("]")
    }
}

impl fmt::Debug for ConfigProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProxy")
            .field("schema", &self.inner.schema.name)
            .field("tree", &self.inner.tree)
            .finish()
    }
}

/// Builds every member resolver of `schema` over `tree`.
pub(crate) fn build_resolvers(
    schema: &Arc<SchemaSpec>,
    tree: &TreeHandle,
    context: &Arc<FactoryContext>,
) -> Result<IndexMap<String, SharedResolver>, ConfigError> {
    let mut resolvers = IndexMap::with_capacity(schema.members.len());
    for member in &schema.members {
        let resolver = pipeline::resolver_for_member(schema, member, tree, context)?;
        resolvers.insert(member.name.clone(), resolver);
    }
    Ok(resolvers)
}

pub(crate) fn build_proxy(schema: &Arc<SchemaSpec>, tree: &TreeHandle, context: &Arc<FactoryContext>) -> Result<ConfigProxy, ConfigError> {
    let resolvers = build_resolvers(schema, tree, context)?;
    Ok(ConfigProxy {
        inner: Arc::new(ProxyInner {
            schema: Arc::clone(schema),
            tree: Arc::clone(tree),
            resolvers,
        }),
    })
}
