//! The format-agnostic document tree shared by every decoder and encoder.
//!
//! A [`Value`] is built fresh for each document, handed from a decoder to an
//! encoder, and dropped. Mapping keys are full `Value`s rather than `String`s so
//! that decoding never loses information: YAML allows `1: one` or `true: yes`,
//! and it is the target encoder's job to reject such keys with a precise path.

use std::fmt;

/// Date, date-time, or time-of-day scalar (RFC 3339 / TOML datetime grammar).
///
/// Covers offset date-times, local date-times, local dates, and local times.
pub use toml::value::Datetime as Timestamp;

/// A decoded document value. Mirrors the common data model of YAML, TOML and
/// JSON: scalars, sequences, and ordered mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Wide enough for every signed and unsigned 64-bit source integer.
    Integer(i128),
    Float(f64),
    String(String),
    Timestamp(Timestamp),
    Sequence(Vec<Value>),
    /// Key-value pairs in source order. Keys are unique within one mapping.
    Mapping(Vec<(Value, Value)>),
}

impl Value {
    /// Human-readable name of the construct, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Value::Mapping(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a string key in a mapping. Returns `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Compact single-line rendering, used for keys in error paths.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::Sequence(items) => write!(f, "[{} items]", items.len()),
            Value::Mapping(entries) => write!(f, "{{{} entries}}", entries.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Mapping(
            iter.into_iter()
                .map(|(k, v)| (Value::String(k), v))
                .collect(),
        )
    }
}
