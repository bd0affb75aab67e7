//! Resolvers that wrap another resolver to add one behavior each.
//!
//! Decorators never inspect each other. The pipeline stacks them, outer to inner, as
//! caching → validation → required → defaults → base (or lookup indirection).

mod caching;
mod default;
mod lookup;
mod required;
mod validation;

pub use caching::CachingResolver;
pub use default::{DefaultGivenValueResolver, DefaultLookupResolver};
pub use lookup::LookupResolver;
pub use required::RequiredResolver;
pub use validation::ValidatingResolver;
