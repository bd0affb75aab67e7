//! Dynamic results of resolving a member.
//!
//! [`Value`] is what every resolver produces. Containers hold shared immutable snapshots, so cloning
//! a resolved list or map is cheap and never observes later store mutations. Proxies and tree
//! handles, on the other hand, are live views.

mod decimal;

use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

pub use decimal::{Decimal, DecimalParseError};
use indexmap::IndexMap;
use typedconf_types::TreeHandle;

use crate::{error::ConfigError, proxy::ConfigProxy};

/// A value produced by a user-registered factory for a `Custom` type.
pub trait CustomValue: fmt::Debug + fmt::Display + Send + Sync {
    fn type_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    BigInteger(i128),
    BigDecimal(Decimal),
    /// Label of an enum member.
    Enum(String),
    Tree(TreeHandle),
    Proxy(ConfigProxy),
    List(Arc<[Value]>),
    Set(Arc<[Value]>),
    SortedSet(Arc<[Value]>),
    Map(ConfigMap),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::BigInteger(_) => "big_integer",
            Self::BigDecimal(_) => "big_decimal",
            Self::Enum(_) => "enum",
            Self::Tree(_) => "tree",
            Self::Proxy(_) => "proxy",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::SortedSet(_) => "sorted_set",
            Self::Map(_) => "map",
            Self::Custom(_) => "custom",
        }
    }

    /// Elements of a list or set, in resolution order.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::SortedSet(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&ConfigProxy> {
        match self {
            Self::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) | Self::Enum(text) => Some(text),
            _ => None,
        }
    }

    /// Hash used when folding member values into a proxy hash code.
    pub fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_) | Self::BigInteger(_) => 2,
            Self::F32(_) | Self::F64(_) => 3,
            Self::BigDecimal(_) => 4,
            Self::String(_) => 5,
            Self::Enum(_) => 6,
            Self::List(_) => 7,
            Self::Set(_) => 8,
            Self::SortedSet(_) => 9,
            Self::Map(_) => 10,
            Self::Proxy(_) => 11,
            Self::Tree(_) => 12,
            Self::Custom(_) => 13,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(i128::from(*v)),
            Self::I16(v) => Some(i128::from(*v)),
            Self::I32(v) => Some(i128::from(*v)),
            Self::I64(v) => Some(i128::from(*v)),
            Self::BigInteger(v) => Some(*v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }
}

fn tree_address(tree: &TreeHandle) -> *const () {
    Arc::as_ptr(tree) as *const ()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    /// Total order: values of different kinds order by kind, integers compare across widths, floats
    /// use IEEE total order, proxies compare by schema name and hash code.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) | (Self::Enum(a), Self::Enum(b)) => a.cmp(b),
            (Self::BigDecimal(a), Self::BigDecimal(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) | (Self::Set(a), Self::Set(b)) | (Self::SortedSet(a), Self::SortedSet(b)) => a.iter().cmp(b.iter()),
            (Self::Map(a), Self::Map(b)) => a.entries().iter().cmp(b.entries().iter()),
            (Self::Proxy(a), Self::Proxy(b)) => a
                .schema()
                .name
                .cmp(&b.schema().name)
                .then_with(|| a.hash_code().unwrap_or(0).cmp(&b.hash_code().unwrap_or(0))),
            (Self::Tree(a), Self::Tree(b)) => tree_address(a).cmp(&tree_address(b)),
            (Self::Custom(a), Self::Custom(b)) => a.type_name().cmp(b.type_name()).then_with(|| a.to_string().cmp(&b.to_string())),
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    _ => Ordering::Equal,
                },
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::String(v) | Self::Enum(v) => v.hash(state),
            Self::I8(_) | Self::I16(_) | Self::I32(_) | Self::I64(_) | Self::BigInteger(_) => self.as_i128().hash(state),
            Self::F32(_) | Self::F64(_) => self.as_f64().map(f64::to_bits).hash(state),
            Self::BigDecimal(v) => v.hash(state),
            Self::List(items) | Self::Set(items) | Self::SortedSet(items) => items.hash(state),
            Self::Map(map) => {
                for (key, value) in map.entries().iter() {
                    key.hash(state);
                    value.hash(state);
                }
            }
            Self::Proxy(proxy) => {
                proxy.schema().name.hash(state);
                proxy.hash_code().unwrap_or(0).hash(state);
            }
            Self::Tree(tree) => tree_address(tree).hash(state),
            Self::Custom(custom) => {
                custom.type_name().hash(state);
                custom.to_string().hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) | Self::Enum(v) => f.write_str(v),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::BigInteger(v) => write!(f, "{v}"),
            Self::BigDecimal(v) => write!(f, "{v}"),
            Self::Tree(tree) => write!(f, "Tree({})", tree.root_name()),
            Self::Proxy(proxy) => write!(f, "{proxy}"),
            Self::List(items) | Self::Set(items) | Self::SortedSet(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => write!(f, "{map}"),
            Self::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

/// A resolved map container: elements keyed by one of their own properties.
#[derive(Debug, Clone)]
pub struct ConfigMap {
    key: String,
    required: bool,
    entries: Arc<IndexMap<Value, Value>>,
}

impl ConfigMap {
    pub(crate) fn new(key: impl Into<String>, required: bool, entries: IndexMap<Value, Value>) -> Self {
        Self {
            key: key.into(),
            required,
            entries: Arc::new(entries),
        }
    }

    /// Looks up an element by its map key.
    ///
    /// # Returns
    /// `Ok(None)` for a missing key on a non-required map; a missing key on a required map fails with
    /// [`ConfigError::RequiredMapKeyMissing`].
    pub fn get(&self, map_key: &Value) -> Result<Option<&Value>, ConfigError> {
        match self.entries.get(map_key) {
            Some(value) => Ok(Some(value)),
            None if self.required => Err(ConfigError::RequiredMapKeyMissing {
                key: self.key.clone(),
                map_key: map_key.to_string(),
            }),
            None => Ok(None),
        }
    }

    pub fn contains_key(&self, map_key: &Value) -> bool {
        self.entries.contains_key(map_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn entries(&self) -> &IndexMap<Value, Value> {
        &self.entries
    }
}

impl fmt::Display for ConfigMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::BigDecimal(value)
    }
}

fn mismatch(expected: &str, found: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

macro_rules! integer_extraction {
    ($($target:ty => $name:literal),* $(,)?) => {
        $(
            impl TryFrom<Value> for $target {
                type Error = ConfigError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    value
                        .as_i128()
                        .and_then(|wide| <$target>::try_from(wide).ok())
                        .ok_or_else(|| mismatch($name, &value))
                }
            }
        )*
    };
}

integer_extraction!(i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64", i128 => "big_integer");

impl TryFrom<Value> for bool {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(flag) => Ok(flag),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) | Value::Enum(text) => Ok(text),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::F32(v) => Ok(f64::from(v)),
            Value::F64(v) => Ok(v),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl TryFrom<Value> for f32 {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::F32(v) => Ok(v),
            other => Err(mismatch("f32", &other)),
        }
    }
}

impl TryFrom<Value> for Decimal {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::BigDecimal(v) => Ok(v),
            Value::BigInteger(v) => Ok(Decimal::from(v)),
            other => Err(mismatch("big_decimal", &other)),
        }
    }
}

impl TryFrom<Value> for ConfigProxy {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Proxy(proxy) => Ok(proxy),
            other => Err(mismatch("proxy", &other)),
        }
    }
}

impl TryFrom<Value> for ConfigMap {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(mismatch("map", &other)),
        }
    }
}

impl TryFrom<Value> for Vec<Value> {
    type Error = ConfigError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_slice() {
            Some(items) => Ok(items.to_vec()),
            None => Err(mismatch("list", &value)),
        }
    }
}
