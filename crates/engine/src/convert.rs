//! Text to typed value conversion.

use thiserror::Error;
use typedconf_types::{ScalarKind, TypeDescriptor};

use crate::value::{Decimal, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{raw}' to {target}: {reason}")]
pub struct ConvertError {
    pub raw: String,
    pub target: String,
    pub reason: String,
}

/// Turns raw store text into a value of a declared type.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, text: &str, target: &TypeDescriptor) -> Result<Value, ConvertError>;
}

/// Converter for every scalar and enum type the built-in factories handle.
///
/// Input is trimmed before parsing (strings excepted). Booleans accept `true/false`, `yes/no`,
/// `on/off`, `y/n`, `t/f` and `1/0` in any case; integers accept `0x` and `0b` prefixes and are
/// range-checked against the target width.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConverter;

impl ValueConverter for StandardConverter {
    fn convert(&self, text: &str, target: &TypeDescriptor) -> Result<Value, ConvertError> {
        let fail = |reason: &str| ConvertError {
            raw: text.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
        };
        match target {
            TypeDescriptor::Scalar { kind, .. } => convert_scalar(text, *kind).map_err(|reason| fail(&reason)),
            TypeDescriptor::Enum(enum_type) => {
                let label = text.trim();
                if enum_type.contains(label) {
                    Ok(Value::Enum(label.to_string()))
                } else {
                    Err(fail(&format!("not one of {}", enum_type.variants.join(", "))))
                }
            }
            _ => Err(fail("not a scalar type")),
        }
    }
}

fn convert_scalar(text: &str, kind: ScalarKind) -> Result<Value, String> {
    if kind == ScalarKind::String {
        return Ok(Value::String(text.to_string()));
    }
    let trimmed = text.trim();
    match kind {
        ScalarKind::Bool => parse_bool(trimmed).map(Value::Bool),
        ScalarKind::I8 => narrow(trimmed, Value::I8),
        ScalarKind::I16 => narrow(trimmed, Value::I16),
        ScalarKind::I32 => narrow(trimmed, Value::I32),
        ScalarKind::I64 => narrow(trimmed, Value::I64),
        ScalarKind::BigInteger => parse_integer(trimmed).map(Value::BigInteger),
        ScalarKind::F32 => trimmed.parse::<f32>().map(Value::F32).map_err(|err| err.to_string()),
        ScalarKind::F64 => trimmed.parse::<f64>().map(Value::F64).map_err(|err| err.to_string()),
        ScalarKind::BigDecimal => trimmed.parse::<Decimal>().map(Value::BigDecimal).map_err(|err| err.to_string()),
        ScalarKind::String => Ok(Value::String(text.to_string())),
    }
}

fn parse_bool(text: &str) -> Result<bool, String> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "t" | "1" => Ok(true),
        "false" | "no" | "off" | "n" | "f" | "0" => Ok(false),
        _ => Err("not a boolean".to_string()),
    }
}

fn narrow<T: TryFrom<i128>>(text: &str, wrap: fn(T) -> Value) -> Result<Value, String> {
    let wide = parse_integer(text)?;
    T::try_from(wide).map(wrap).map_err(|_| "out of range".to_string())
}

fn parse_integer(text: &str) -> Result<i128, String> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let lower = unsigned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        i128::from_str_radix(hex, 16)
    } else if let Some(binary) = lower.strip_prefix("0b") {
        i128::from_str_radix(binary, 2)
    } else {
        lower.parse::<i128>()
    };
    let magnitude = parsed.map_err(|err| err.to_string())?;
    Ok(if negative { -magnitude } else { magnitude })
}
