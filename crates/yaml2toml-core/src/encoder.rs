//! Encoders: [`Value`] → target text.
//!
//! Encoding happens in two passes:
//!
//! 1. [`validate`] walks the tree once and rejects anything the target format
//!    cannot express, reporting the first offending node by path
//!    (`root.server.ports[2]`).
//! 2. The tree is mapped onto the target library's own value type and handed
//!    to its serializer. Mapping order is carried through unchanged, so output
//!    is a pure function of the input tree.
//!
//! Nothing is coerced. TOML has no null, so `key: null` is an error rather
//! than a dropped key or an empty string.
//!
//! # TOML layout
//!
//! TOML requires a table's plain `key = value` lines to precede its
//! `[sub.table]` sections. The serializer hoists sub-tables below plain
//! values; relative order inside each group follows the source.

use std::fmt;

use crate::error::{Construct, ConvertError, Result};
use crate::format::Format;
use crate::value::Value;

/// Encode `value` as a `format` document.
pub fn encode(value: &Value, format: Format) -> Result<Vec<u8>> {
    encode_to_string(value, format).map(String::into_bytes)
}

/// Encode `value` as a `format` document, returning text.
pub fn encode_to_string(value: &Value, format: Format) -> Result<String> {
    validate(value, format)?;
    match format {
        Format::Toml => encode_toml(value),
        Format::Yaml => encode_yaml(value),
        Format::Json => encode_json(value),
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a node inside the document, rendered as `root.key[0].sub`.
struct NodePath<'a>(&'a [Segment]);

impl fmt::Display for NodePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for segment in self.0 {
            match segment {
                Segment::Key(key) if is_bare_key(key) => write!(f, ".{key}")?,
                Segment::Key(key) => write!(f, ".{key:?}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check that `value` is representable in `format` without encoding it.
pub fn validate(value: &Value, format: Format) -> Result<()> {
    let mut path = Vec::new();
    if format.requires_mapping_root() && !value.is_mapping() {
        return Err(incompatible(format, &path, Construct::NonMappingRoot));
    }
    check(value, format, &mut path)
}

fn incompatible(format: Format, path: &[Segment], construct: Construct) -> ConvertError {
    ConvertError::Incompatible {
        format,
        path: NodePath(path).to_string(),
        construct,
    }
}

fn integer_fits(i: i128, format: Format) -> bool {
    match format {
        Format::Toml => i64::try_from(i).is_ok(),
        Format::Yaml | Format::Json => i64::try_from(i).is_ok() || u64::try_from(i).is_ok(),
    }
}

fn check(value: &Value, format: Format, path: &mut Vec<Segment>) -> Result<()> {
    match value {
        Value::Null if format == Format::Toml => {
            Err(incompatible(format, path, Construct::NullValue))
        }
        Value::Integer(i) if !integer_fits(*i, format) => {
            Err(incompatible(format, path, Construct::IntegerOutOfRange))
        }
        Value::Float(f) if format == Format::Json && !f.is_finite() => {
            Err(incompatible(format, path, Construct::NonFiniteFloat))
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(Segment::Index(i));
                check(item, format, path)?;
                path.pop();
            }
            Ok(())
        }
        Value::Mapping(entries) => {
            for (key, item) in entries {
                let name = match key {
                    Value::String(s) => s.clone(),
                    other if format == Format::Yaml => {
                        check(other, format, path)?;
                        other.to_string()
                    }
                    other => {
                        path.push(Segment::Key(other.to_string()));
                        return Err(incompatible(format, path, Construct::NonStringKey));
                    }
                };
                path.push(Segment::Key(name));
                check(item, format, path)?;
                path.pop();
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ── TOML ─────────────────────────────────────────────────────────────────────

fn encode_toml(value: &Value) -> Result<String> {
    match to_toml(value)? {
        toml::Value::Table(table) => {
            toml::to_string(&table).map_err(|e| ConvertError::encode(Format::Toml, e))
        }
        other => Err(ConvertError::encode(
            Format::Toml,
            format!("root must be a table, found {}", other.type_str()),
        )),
    }
}

fn to_toml(value: &Value) -> Result<toml::Value> {
    Ok(match value {
        Value::Null => return Err(ConvertError::encode(Format::Toml, "null has no TOML form")),
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Integer(i) => toml::Value::Integer(
            i64::try_from(*i).map_err(|e| ConvertError::encode(Format::Toml, e))?,
        ),
        Value::Float(f) => toml::Value::Float(*f),
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Timestamp(ts) => toml::Value::Datetime(ts.clone()),
        Value::Sequence(items) => toml::Value::Array(
            items
                .iter()
                .map(to_toml)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(entries) => {
            let mut table = toml::Table::new();
            for (key, item) in entries {
                let key = key.as_str().ok_or_else(|| {
                    ConvertError::encode(Format::Toml, format!("{} key", key.kind()))
                })?;
                table.insert(key.to_string(), to_toml(item)?);
            }
            toml::Value::Table(table)
        }
    })
}

// ── YAML ─────────────────────────────────────────────────────────────────────

fn encode_yaml(value: &Value) -> Result<String> {
    serde_yaml::to_string(&to_yaml(value)?).map_err(|e| ConvertError::encode(Format::Yaml, e))
}

fn to_yaml(value: &Value) -> Result<serde_yaml::Value> {
    Ok(match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Integer(i) => serde_yaml::Value::Number(if let Ok(n) = i64::try_from(*i) {
            n.into()
        } else {
            u64::try_from(*i)
                .map_err(|e| ConvertError::encode(Format::Yaml, e))?
                .into()
        }),
        Value::Float(f) => serde_yaml::Value::Number((*f).into()),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Timestamp(ts) => serde_yaml::Value::String(ts.to_string()),
        Value::Sequence(items) => serde_yaml::Value::Sequence(
            items
                .iter()
                .map(to_yaml)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(entries) => {
            let mut map = serde_yaml::Mapping::with_capacity(entries.len());
            for (key, item) in entries {
                map.insert(to_yaml(key)?, to_yaml(item)?);
            }
            serde_yaml::Value::Mapping(map)
        }
    })
}

// ── JSON ─────────────────────────────────────────────────────────────────────

fn encode_json(value: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&to_json(value)?)
        .map_err(|e| ConvertError::encode(Format::Json, e))?;
    text.push('\n');
    Ok(text)
}

fn to_json(value: &Value) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number(if let Ok(n) = i64::try_from(*i) {
            n.into()
        } else {
            u64::try_from(*i)
                .map_err(|e| ConvertError::encode(Format::Json, e))?
                .into()
        }),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ConvertError::encode(Format::Json, format!("non-finite float {f}")))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Timestamp(ts) => serde_json::Value::String(ts.to_string()),
        Value::Sequence(items) => serde_json::Value::Array(
            items
                .iter()
                .map(to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, item) in entries {
                let key = key.as_str().ok_or_else(|| {
                    ConvertError::encode(Format::Json, format!("{} key", key.kind()))
                })?;
                map.insert(key.to_string(), to_json(item)?);
            }
            serde_json::Value::Object(map)
        }
    })
}
