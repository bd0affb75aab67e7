//! Declared value types for schema members.
//!
//! A [`TypeDescriptor`] is the statically declared shape of a member's value. The engine uses it to
//! pick a resolver factory and to decide whether a key addresses a leaf, a nested sub-tree, or a
//! repeated set of nodes.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::schema::SchemaSpec;

/// Leaf value kinds understood by the built-in converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    String,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    BigInteger,
    BigDecimal,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::BigInteger => "big_integer",
            Self::BigDecimal => "big_decimal",
        }
    }

    /// Returns true for the integral kinds (`i8` through `i64`).
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns true for `f32` and `f64`.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// A closed set of labels a member may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    /// Name used in diagnostics.
    pub name: String,
    /// Accepted labels, matched case-sensitively.
    pub variants: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.variants.iter().any(|variant| variant == label)
    }
}

/// Declared type of a schema member.
///
/// Scalars carry a `primitive` flag: primitive members cannot represent absence and are therefore
/// implicitly required. Containers wrap exactly one element type; `Map` additionally names the key
/// type, which is produced by projecting a property of each element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Scalar {
        kind: ScalarKind,
        #[serde(default)]
        primitive: bool,
    },
    Enum(EnumType),
    /// The raw configuration sub-tree the member is bound to.
    Tree,
    List(Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    SortedSet(Box<TypeDescriptor>),
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// Another schema, bound to a nested sub-tree.
    Schema(Arc<SchemaSpec>),
    /// A type only user-registered factories know how to build.
    Custom(String),
}

impl TypeDescriptor {
    /// A nullable scalar.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar { kind, primitive: false }
    }

    /// A non-nullable scalar; resolving it to nothing is an error.
    pub fn primitive(kind: ScalarKind) -> Self {
        Self::Scalar { kind, primitive: true }
    }

    pub fn string() -> Self {
        Self::scalar(ScalarKind::String)
    }

    pub fn enumeration(enum_type: EnumType) -> Self {
        Self::Enum(enum_type)
    }

    pub fn schema(schema: Arc<SchemaSpec>) -> Self {
        Self::Schema(schema)
    }

    pub fn list_of(element: TypeDescriptor) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set_of(element: TypeDescriptor) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn sorted_set_of(element: TypeDescriptor) -> Self {
        Self::SortedSet(Box::new(element))
    }

    pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Scalar { primitive: true, .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::SortedSet(_) | Self::Map { .. })
    }

    /// Unwraps one container level. For maps this is the value type.
    pub fn contained_type(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::List(element) | Self::Set(element) | Self::SortedSet(element) => Some(element),
            Self::Map { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn map_key_type(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Map { key, .. } => Some(key),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Arc<SchemaSpec>> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { kind, primitive: true } => write!(f, "{} (primitive)", kind.as_str()),
            Self::Scalar { kind, primitive: false } => f.write_str(kind.as_str()),
            Self::Enum(enum_type) => write!(f, "enum {}", enum_type.name),
            Self::Tree => f.write_str("Tree"),
            Self::List(element) => write!(f, "List<{element}>"),
            Self::Set(element) => write!(f, "Set<{element}>"),
            Self::SortedSet(element) => write!(f, "SortedSet<{element}>"),
            Self::Map { key, value } => write!(f, "Map<{key}, {value}>"),
            Self::Schema(schema) => f.write_str(&schema.name),
            Self::Custom(name) => f.write_str(name),
        }
    }
}
