//! # Typedconf Engine
//!
//! Binds declarative schemas to a hierarchical configuration store and hands out live, typed views
//! (proxies) instead of one-shot snapshots.
//!
//! ## Key Features
//!
//! - **Type-directed dispatch**: an ordered registry of resolver factories turns each member into a
//!   simple, nested or container accessor
//! - **Decorators**: defaults, lookup indirection, required checks, validation and caching wrap the
//!   base accessor without knowing about each other
//! - **Invalidation**: store change events invalidate cached nested proxies through a per-factory bus
//!
//! ## Usage
//!
//! ```rust
//! use typedconf_engine::{BindingOption, ConfigProxyFactory, MemberSpec, ScalarKind, SchemaSpec, TypeDescriptor};
//! use typedconf_store::MemoryTree;
//!
//! let schema = SchemaSpec::new("Car")
//!     .with_member(MemberSpec::new("doors", TypeDescriptor::scalar(ScalarKind::I32)).with_default_value("4"))
//!     .with_member(MemberSpec::new("name", TypeDescriptor::string()).with_key("[@name]"))
//!     .with_member(
//!         MemberSpec::new("hasAC", TypeDescriptor::scalar(ScalarKind::Bool))
//!             .with_key("air-conditioning")
//!             .with_options([BindingOption::CheckKeyExists]),
//!     )
//!     .shared();
//! let tree = MemoryTree::from_yaml_str("car", "'@name': Roadster\nair-conditioning: ~\n")?;
//!
//! let car = ConfigProxyFactory::builder().build().make_proxy(&schema, &tree.handle())?;
//! assert_eq!(car.to_string(), "Car[doors=4,name=Roadster,hasAC=true]");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolver`**: resolver and factory traits, the factory registry, built-in accessors
//! - **`decorator`**: resolvers wrapping resolvers
//! - **`strategy`**: caching, default, validation and key-combination policies
//! - **`proxy`**: per-member pipeline and the [`ConfigProxy`] dispatch surface
//! - **`factory`**: [`ConfigProxyFactory`] and its builder
//! - **`bus`**: cache invalidation channel

pub mod bus;
pub mod convert;
pub mod decorator;
pub mod error;
pub mod factory;
pub mod proxy;
pub mod resolver;
pub mod strategy;
pub mod validate;
pub mod value;

pub use bus::{Invalidate, InvalidationBus};
pub use convert::{ConvertError, StandardConverter, ValueConverter};
pub use error::ConfigError;
pub use factory::{ConfigProxyFactory, ConfigProxyFactoryBuilder, ConfigSchema, FactoryContext};
pub use proxy::ConfigProxy;
pub use resolver::{ResolverFactory, SharedResolver, ValueResolver, ValueResolverRegistry, ValueType};
pub use strategy::{
    CacheEverythingForever, CacheNestedProxies, CacheNothing, ConstraintValidationStrategy, DelimitedKeyCombination, MemberDefaultsStrategy,
    NoValidation, SmartKeyCombination,
};
pub use typedconf_types::{
    Annotation, Binding, BindingOption, ConfigTree, ConstraintDescriptor, EnumType, MemberSpec, ScalarKind, SchemaSpec, TreeHandle,
    TypeDescriptor,
};
pub use validate::{ConstraintValidator, Violation};
pub use value::{ConfigMap, CustomValue, Decimal, Value};
