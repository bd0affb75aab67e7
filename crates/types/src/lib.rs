//! Shared definitions for typedconf.
//!
//! This crate holds the plain data that describes *what* to bind (schemas, members, declared types,
//! bindings) and the contract of the hierarchical store the engine reads from. It has no resolution
//! logic of its own.

pub mod annotation;
pub mod binding;
pub mod descriptor;
pub mod schema;
pub mod tree;

pub use annotation::{Annotation, ConstraintDescriptor};
pub use binding::{Binding, BindingOption};
pub use descriptor::{EnumType, ScalarKind, TypeDescriptor};
pub use schema::{MemberSpec, SchemaSpec};
pub use tree::{ChangeEvent, ChangeKind, ChangeListener, ChangePhase, ConfigTree, KeyDialect, TreeHandle, print_tree};
