//! Typed key/value settings
//!
//! Values are a small closed set of primitive types so they can be written
//! by every snapshot format.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A settings value
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Str(String),
    Int(i32),
    Float(f64),
    Bool(bool),
}

/// Type of a [`DynamicValue`], without the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Int,
    Float,
    Bool,
}

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("unknown value type '{0}' (expected string, int, float or bool)")]
    UnknownKind(String),

    #[error("cannot parse '{text}' as {kind}")]
    Parse { text: String, kind: ValueKind },

    #[error("expected {expected} value, found {found}")]
    WrongKind { expected: ValueKind, found: ValueKind },
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" | "s" => Ok(Self::String),
            "int" | "i32" | "i" => Ok(Self::Int),
            "float" | "double" | "f64" | "d" => Ok(Self::Float),
            "bool" | "b" => Ok(Self::Bool),
            other => Err(ValueError::UnknownKind(other.to_string())),
        }
    }
}

impl DynamicValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Str(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
        }
    }

    /// Parse user text as a value of the given kind
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self, ValueError> {
        let parse_error = || ValueError::Parse {
            text: text.to_string(),
            kind,
        };
        match kind {
            ValueKind::String => Ok(Self::Str(text.to_string())),
            ValueKind::Int => text.trim().parse().map(Self::Int).map_err(|_| parse_error()),
            ValueKind::Float => text.trim().parse().map(Self::Float).map_err(|_| parse_error()),
            ValueKind::Bool => text.trim().parse().map(Self::Bool).map_err(|_| parse_error()),
        }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(d) => write!(f, "{}", d),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<i32> for DynamicValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_try_from_value {
    ($ty:ty, $variant:ident, $kind:ident) => {
        impl TryFrom<DynamicValue> for $ty {
            type Error = ValueError;

            fn try_from(value: DynamicValue) -> Result<Self, Self::Error> {
                match value {
                    DynamicValue::$variant(v) => Ok(v),
                    other => Err(ValueError::WrongKind {
                        expected: ValueKind::$kind,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_try_from_value!(String, Str, String);
impl_try_from_value!(i32, Int, Int);
impl_try_from_value!(f64, Float, Float);
impl_try_from_value!(bool, Bool, Bool);

/// Key/value store persisted with the snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, DynamicValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed lookup; `None` when missing or of another type
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: TryFrom<DynamicValue>,
    {
        self.values
            .get(key)
            .cloned()
            .and_then(|v| T::try_from(v).ok())
    }

    /// Typed lookup with a fallback
    pub fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: TryFrom<DynamicValue>,
    {
        self.get(key).unwrap_or(default)
    }

    /// Untyped lookup
    pub fn get_value(&self, key: &str) -> Option<&DynamicValue> {
        self.values.get(key)
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<DynamicValue>,
    ) -> Option<DynamicValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<DynamicValue> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DynamicValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, DynamicValue)> for Settings {
    fn from_iter<T: IntoIterator<Item = (String, DynamicValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
