//! Leaf types and their restrictions.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::SchemaError;

/// Built-in base types of leaf and leaf-list nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseType {
    String,
    Binary,
    Boolean,
    Empty,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Enumeration,
    Leafref,
    InstanceIdentifier,
}

impl BaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Empty => "empty",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 => "decimal64",
            Self::Enumeration => "enumeration",
            Self::Leafref => "leafref",
            Self::InstanceIdentifier => "instance-identifier",
        }
    }

    /// Inclusive value bounds of the integer types.
    pub fn int_bounds(self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::Int16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::Int32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::Int64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::Uint8 => Some((0, u8::MAX as i128)),
            Self::Uint16 => Some((0, u16::MAX as i128)),
            Self::Uint32 => Some((0, u32::MAX as i128)),
            Self::Uint64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.int_bounds().is_some()
    }
}

// ── Range and length restrictions ──────────────────────────────────────────

/// One end of a range part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    Value(i128),
}

/// A `range` or `length` restriction: `1..10 | 20 | 100..max`.
///
/// Decimal bounds are stored scaled by `10^fraction_digits`, so every
/// comparison is integral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSet {
    source: String,
    parts: Vec<(Bound, Bound)>,
}

impl RangeSet {
    /// Parses a restriction expression. `scale` is the number of fraction
    /// digits of decimal bounds (0 for integers and lengths).
    ///
    /// # Example
    ///
    /// ```
    /// use yangtree_schema::RangeSet;
    ///
    /// let range = RangeSet::parse("1..10 | 20 | 100..max", 0).unwrap();
    /// assert!(range.contains(5, 0, 1000));
    /// assert!(range.contains(20, 0, 1000));
    /// assert!(!range.contains(15, 0, 1000));
    /// assert!(range.contains(1000, 0, 1000));
    /// ```
    pub fn parse(source: &str, scale: u8) -> Result<Self, SchemaError> {
        let invalid = || SchemaError::InvalidRestriction(source.to_string());
        let mut parts = Vec::new();
        for part in source.split('|') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid());
            }
            let (lo, hi) = match part.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (part, part),
            };
            let lo = parse_bound(lo, scale).ok_or_else(invalid)?;
            let hi = parse_bound(hi, scale).ok_or_else(invalid)?;
            parts.push((lo, hi));
        }
        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if `value` falls in any part. `min`/`max` resolve the keyword bounds.
    pub fn contains(&self, value: i128, min: i128, max: i128) -> bool {
        let resolve = |bound: Bound| match bound {
            Bound::Min => min,
            Bound::Max => max,
            Bound::Value(v) => v,
        };
        self.parts
            .iter()
            .any(|&(lo, hi)| resolve(lo) <= value && value <= resolve(hi))
    }
}

fn parse_bound(text: &str, scale: u8) -> Option<Bound> {
    match text {
        "min" => Some(Bound::Min),
        "max" => Some(Bound::Max),
        _ => parse_scaled(text, scale).map(Bound::Value),
    }
}

/// Parses a decimal literal into an integer scaled by `10^scale`.
///
/// Returns `None` if the literal has more fraction digits than `scale` or is
/// not a number.
///
/// # Example
///
/// ```
/// use yangtree_schema::types::parse_scaled;
///
/// assert_eq!(parse_scaled("1.5", 2), Some(150));
/// assert_eq!(parse_scaled("-0.25", 2), Some(-25));
/// assert_eq!(parse_scaled("42", 0), Some(42));
/// assert_eq!(parse_scaled("1.555", 2), None);
/// ```
pub fn parse_scaled(text: &str, scale: u8) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) if !f.is_empty() => (i, f),
        Some(_) => return None,
        None => (digits, ""),
    };
    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
        || frac_part.len() > scale as usize
    {
        return None;
    }
    let mut value: i128 = int_part.parse().ok()?;
    for _ in 0..scale {
        value = value.checked_mul(10)?;
    }
    if !frac_part.is_empty() {
        let mut frac: i128 = frac_part.parse().ok()?;
        for _ in frac_part.len()..scale as usize {
            frac = frac.checked_mul(10)?;
        }
        value = value.checked_add(frac)?;
    }
    Some(if negative { -value } else { value })
}

// ── Patterns ───────────────────────────────────────────────────────────────

/// A compiled `pattern` restriction. The whole value must match.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    invert: bool,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, SchemaError> {
        Self::compile(source, false)
    }

    /// A pattern that rejects matching values (`modifier invert-match`).
    pub fn inverted(source: &str) -> Result<Self, SchemaError> {
        Self::compile(source, true)
    }

    fn compile(source: &str, invert: bool) -> Result<Self, SchemaError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| SchemaError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
            invert,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value) != self.invert
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.invert == other.invert
    }
}

// ── LeafType ───────────────────────────────────────────────────────────────

/// The type of a leaf or leaf-list with its restrictions.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafType {
    pub base: BaseType,
    pub range: Option<RangeSet>,
    pub length: Option<RangeSet>,
    pub patterns: Vec<Pattern>,
    pub enums: Vec<String>,
    pub fraction_digits: u8,
    /// Target path of a leafref.
    pub path: Option<String>,
    pub require_instance: bool,
}

impl LeafType {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            range: None,
            length: None,
            patterns: Vec::new(),
            enums: Vec::new(),
            fraction_digits: 0,
            path: None,
            require_instance: true,
        }
    }

    pub fn string() -> Self {
        Self::new(BaseType::String)
    }

    pub fn boolean() -> Self {
        Self::new(BaseType::Boolean)
    }

    pub fn empty() -> Self {
        Self::new(BaseType::Empty)
    }

    pub fn binary() -> Self {
        Self::new(BaseType::Binary)
    }

    pub fn decimal64(fraction_digits: u8) -> Self {
        Self {
            fraction_digits,
            ..Self::new(BaseType::Decimal64)
        }
    }

    pub fn enumeration<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            enums: names.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Self::new(BaseType::Enumeration)
        }
    }

    pub fn leafref(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::new(BaseType::Leafref)
        }
    }

    pub fn instance_identifier() -> Self {
        Self::new(BaseType::InstanceIdentifier)
    }

    pub fn with_range(mut self, range: &str) -> Result<Self, SchemaError> {
        let scale = match self.base {
            BaseType::Decimal64 => self.fraction_digits,
            _ => 0,
        };
        self.range = Some(RangeSet::parse(range, scale)?);
        Ok(self)
    }

    pub fn with_length(mut self, length: &str) -> Result<Self, SchemaError> {
        self.length = Some(RangeSet::parse(length, 0)?);
        Ok(self)
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, SchemaError> {
        self.patterns.push(Pattern::new(pattern)?);
        Ok(self)
    }

    pub fn with_require_instance(mut self, require: bool) -> Self {
        self.require_instance = require;
        self
    }

    /// The first pattern `value` does not satisfy.
    pub fn failing_pattern(&self, value: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| !p.is_match(value))
    }

    /// Position of an enumeration name.
    pub fn enum_index(&self, name: &str) -> Option<usize> {
        self.enums.iter().position(|e| e == name)
    }

    /// Bounds used to resolve `min`/`max` in a range restriction.
    pub fn value_bounds(&self) -> (i128, i128) {
        match self.base.int_bounds() {
            Some(bounds) => bounds,
            None => (i64::MIN as i128, i64::MAX as i128),
        }
    }
}
