use std::sync::Arc;

use super::{CacheStrategy, MemberTarget};
use crate::{
    decorator::CachingResolver,
    factory::FactoryContext,
    resolver::{SharedResolver, ValueType},
};

/// Every `resolve` reads through to the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheNothing;

impl CacheStrategy for CacheNothing {
    fn decorate(&self, resolver: SharedResolver, _target: &MemberTarget<'_>, _context: &Arc<FactoryContext>) -> SharedResolver {
        resolver
    }
}

/// Caches nested members only, invalidated whenever the store changes. Simple and container
/// members keep reading through.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheNestedProxies;

impl CacheStrategy for CacheNestedProxies {
    fn decorate(&self, resolver: SharedResolver, target: &MemberTarget<'_>, context: &Arc<FactoryContext>) -> SharedResolver {
        if target.value_type != ValueType::Nested {
            return resolver;
        }
        CachingResolver::subscribed(resolver, context.bus())
    }
}

/// Caches every member and never invalidates. For configuration that is known to be immutable.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheEverythingForever;

impl CacheStrategy for CacheEverythingForever {
    fn decorate(&self, resolver: SharedResolver, _target: &MemberTarget<'_>, _context: &Arc<FactoryContext>) -> SharedResolver {
        Arc::new(CachingResolver::new(resolver))
    }
}
