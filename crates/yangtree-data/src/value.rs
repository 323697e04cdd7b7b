//! Typed leaf values.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use yangtree_schema::types::parse_scaled;
use yangtree_schema::{BaseType, LeafType, RangeSet};

use crate::tree::NodeId;

/// A value rejected by its leaf type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("invalid {ty} value \"{value}\"")]
    Invalid { value: String, ty: &'static str },
    #[error("value \"{value}\" does not fit in {ty}")]
    OutOfBounds { value: String, ty: &'static str },
    #[error("value \"{value}\" does not satisfy the range constraint \"{range}\"")]
    Range { value: String, range: String },
    #[error("value \"{value}\" does not satisfy the length constraint \"{length}\"")]
    Length { value: String, length: String },
    #[error("value \"{value}\" does not match the pattern \"{pattern}\"")]
    Pattern { value: String, pattern: String },
    #[error("invalid enumeration value \"{0}\"")]
    UnknownEnum(String),
    #[error("invalid instance-identifier \"{0}\"")]
    InstanceId(String),
}

/// The value of a leaf or leaf-list entry.
///
/// Equality compares the stored data only; resolved reference targets are
/// ignored.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Enum(String),
    /// Decimal number stored as `value / 10^fraction_digits`.
    Decimal64 { value: i64, fraction_digits: u8 },
    Binary(Vec<u8>),
    Empty,
    Leafref { text: String, target: Option<NodeId> },
    InstanceId { path: String, target: Option<NodeId> },
}

impl Value {
    /// Parses the text form of a value against its leaf type, checking every
    /// restriction the type declares.
    ///
    /// # Example
    ///
    /// ```
    /// use yangtree_data::Value;
    /// use yangtree_schema::{BaseType, LeafType};
    ///
    /// let ty = LeafType::new(BaseType::Uint8).with_range("1..100").unwrap();
    /// assert_eq!(Value::parse(&ty, "42").unwrap(), Value::Uint8(42));
    /// assert!(Value::parse(&ty, "0").is_err());
    /// assert!(Value::parse(&ty, "300").is_err());
    ///
    /// let dec = LeafType::decimal64(2);
    /// assert_eq!(Value::parse(&dec, "1.5").unwrap().to_string(), "1.5");
    /// ```
    pub fn parse(ty: &LeafType, text: &str) -> Result<Value, ValueError> {
        let value = match ty.base {
            BaseType::String => {
                check_length(ty, text, text.chars().count())?;
                Value::String(text.to_string())
            }
            BaseType::Binary => {
                let bytes = STANDARD.decode(text).map_err(|_| invalid(text, ty.base))?;
                check_length(ty, text, bytes.len())?;
                Value::Binary(bytes)
            }
            BaseType::Boolean => match text {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(invalid(text, ty.base)),
            },
            BaseType::Empty => {
                if !text.is_empty() {
                    return Err(invalid(text, ty.base));
                }
                Value::Empty
            }
            BaseType::Int8
            | BaseType::Int16
            | BaseType::Int32
            | BaseType::Int64
            | BaseType::Uint8
            | BaseType::Uint16
            | BaseType::Uint32
            | BaseType::Uint64 => parse_integer(ty, text)?,
            BaseType::Decimal64 => {
                let scaled = parse_scaled(text, ty.fraction_digits).ok_or_else(|| invalid(text, ty.base))?;
                let value = i64::try_from(scaled).map_err(|_| ValueError::OutOfBounds {
                    value: text.to_string(),
                    ty: ty.base.as_str(),
                })?;
                check_range(ty, text, scaled)?;
                Value::Decimal64 {
                    value,
                    fraction_digits: ty.fraction_digits,
                }
            }
            BaseType::Enumeration => {
                if ty.enum_index(text).is_none() {
                    return Err(ValueError::UnknownEnum(text.to_string()));
                }
                Value::Enum(text.to_string())
            }
            BaseType::Leafref => Value::Leafref {
                text: text.to_string(),
                target: None,
            },
            BaseType::InstanceIdentifier => {
                yangtree_path::parse_path(text)
                    .map_err(|_| ValueError::InstanceId(text.to_string()))?;
                Value::InstanceId {
                    path: text.to_string(),
                    target: None,
                }
            }
        };

        if matches!(value, Value::String(_)) {
            if let Some(pattern) = ty.failing_pattern(text) {
                return Err(ValueError::Pattern {
                    value: text.to_string(),
                    pattern: pattern.as_str().to_string(),
                });
            }
        }
        Ok(value)
    }

    /// Re-checks an already typed value against a leaf type.
    pub fn check(&self, ty: &LeafType) -> Result<(), ValueError> {
        Value::parse(ty, &self.to_string()).map(|_| ())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            Value::Leafref { text, .. } => Some(text),
            Value::InstanceId { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value of any integer variant.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Int8(v) => Some(v as i128),
            Value::Int16(v) => Some(v as i128),
            Value::Int32(v) => Some(v as i128),
            Value::Int64(v) => Some(v as i128),
            Value::Uint8(v) => Some(v as i128),
            Value::Uint16(v) => Some(v as i128),
            Value::Uint32(v) => Some(v as i128),
            Value::Uint64(v) => Some(v as i128),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// The resolved node of a leafref or instance-identifier.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Value::Leafref { target, .. } | Value::InstanceId { target, .. } => *target,
            _ => None,
        }
    }

    pub(crate) fn set_target(&mut self, node: Option<NodeId>) {
        if let Value::Leafref { target, .. } | Value::InstanceId { target, .. } = self {
            *target = node;
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Leafref { .. } | Value::InstanceId { .. })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (String(a), String(b)) | (Enum(a), Enum(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Int8(a), Int8(b)) => a == b,
            (Int16(a), Int16(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Uint8(a), Uint8(b)) => a == b,
            (Uint16(a), Uint16(b)) => a == b,
            (Uint32(a), Uint32(b)) => a == b,
            (Uint64(a), Uint64(b)) => a == b,
            (
                Decimal64 {
                    value: a,
                    fraction_digits: fa,
                },
                Decimal64 {
                    value: b,
                    fraction_digits: fb,
                },
            ) => a == b && fa == fb,
            (Binary(a), Binary(b)) => a == b,
            (Empty, Empty) => true,
            (Leafref { text: a, .. }, Leafref { text: b, .. }) => a == b,
            (InstanceId { path: a, .. }, InstanceId { path: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

/// Canonical text form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Enum(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint8(v) => write!(f, "{v}"),
            Value::Uint16(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Decimal64 {
                value,
                fraction_digits,
            } => f.write_str(&format_decimal(*value, *fraction_digits)),
            Value::Binary(bytes) => f.write_str(&STANDARD.encode(bytes)),
            Value::Empty => Ok(()),
            Value::Leafref { text, .. } => f.write_str(text),
            Value::InstanceId { path, .. } => f.write_str(path),
        }
    }
}

/// Renders a scaled decimal with trailing fraction zeros removed, keeping at
/// least one fraction digit.
fn format_decimal(value: i64, fraction_digits: u8) -> String {
    if fraction_digits == 0 {
        return value.to_string();
    }
    let Some(divisor) = 10u64.checked_pow(fraction_digits as u32) else {
        return value.to_string();
    };
    let abs = value.unsigned_abs();
    let int_part = abs / divisor;
    let frac = format!("{:0width$}", abs % divisor, width = fraction_digits as usize);
    let frac = frac.trim_end_matches('0');
    let frac = if frac.is_empty() { "0" } else { frac };
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{int_part}.{frac}")
}

fn invalid(text: &str, base: BaseType) -> ValueError {
    ValueError::Invalid {
        value: text.to_string(),
        ty: base.as_str(),
    }
}

fn parse_integer(ty: &LeafType, text: &str) -> Result<Value, ValueError> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    let n: i128 = digits.parse().map_err(|_| invalid(text, ty.base))?;
    let (min, max) = ty.value_bounds();
    if n < min || n > max {
        return Err(ValueError::OutOfBounds {
            value: text.to_string(),
            ty: ty.base.as_str(),
        });
    }
    check_range(ty, text, n)?;
    // Bounds were checked above, so the narrowing casts are exact.
    Ok(match ty.base {
        BaseType::Int8 => Value::Int8(n as i8),
        BaseType::Int16 => Value::Int16(n as i16),
        BaseType::Int32 => Value::Int32(n as i32),
        BaseType::Int64 => Value::Int64(n as i64),
        BaseType::Uint8 => Value::Uint8(n as u8),
        BaseType::Uint16 => Value::Uint16(n as u16),
        BaseType::Uint32 => Value::Uint32(n as u32),
        _ => Value::Uint64(n as u64),
    })
}

fn check_range(ty: &LeafType, text: &str, n: i128) -> Result<(), ValueError> {
    let Some(range) = &ty.range else {
        return Ok(());
    };
    let (min, max) = ty.value_bounds();
    if range.contains(n, min, max) {
        Ok(())
    } else {
        Err(ValueError::Range {
            value: text.to_string(),
            range: range.as_str().to_string(),
        })
    }
}

fn check_length(ty: &LeafType, text: &str, len: usize) -> Result<(), ValueError> {
    let Some(length) = &ty.length else {
        return Ok(());
    };
    if length_ok(length, len) {
        Ok(())
    } else {
        Err(ValueError::Length {
            value: text.to_string(),
            length: length.as_str().to_string(),
        })
    }
}

fn length_ok(length: &RangeSet, len: usize) -> bool {
    length.contains(len as i128, 0, u64::MAX as i128)
}
