//! Safe decoders: source text → [`Value`].
//!
//! Every decoder produces only the fixed vocabulary of [`Value`]: no document
//! tag can cause anything other than a scalar, sequence or mapping to be built.
//!
//! # YAML
//!
//! YAML is read at the event level so that tags and scalar styles survive
//! until the tree is built. Tags are treated as follows:
//!
//! - Core schema tags (`!!str`, `!!int`, `!!float`, `!!bool`, `!!null`,
//!   `!!seq`, `!!map`) are honoured; the tagged node must match the tag.
//! - `!!timestamp` turns its scalar into a [`Value::Timestamp`].
//! - Every other tag, local (`!Ref`) or global (`!!python/object`), is a
//!   decode failure. Nothing is looked up or instantiated.
//!
//! Untagged plain scalars resolve with the YAML 1.2 core schema (`yes` stays a
//! string) extended with YAML timestamps: `2024-01-01` and
//! `2001-12-14 21:59:43.10 -5` become timestamps. Quoted and block scalars are
//! always strings.
//!
//! Aliases are expanded and merge keys (`<<: *base`) applied while the tree is
//! built, so the result is plain data. Duplicate keys and multi-document
//! streams are rejected.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConvertError, Location, Result};
use crate::format::Format;
use crate::value::{Timestamp, Value};
use crate::yaml_events::{Event, EventReader, NodeStart, Scalar};

/// Decode one document in `format` from raw bytes.
///
/// The input must be UTF-8; a leading byte-order mark is ignored.
pub fn decode(source: &[u8], format: Format) -> Result<Value> {
    let text = std::str::from_utf8(source).map_err(|e| {
        ConvertError::decode(format, format!("input is not valid UTF-8: {e}"))
    })?;
    decode_str(text, format)
}

/// Decode one document in `format` from text.
pub fn decode_str(text: &str, format: Format) -> Result<Value> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match format {
        Format::Yaml => decode_yaml(text),
        Format::Toml => decode_toml(text),
        Format::Json => decode_json(text),
    }
}

// ── YAML ─────────────────────────────────────────────────────────────────────

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Collections nested deeper than this are refused.
const MAX_DEPTH: usize = 256;

/// Upper bound on nodes copied in by alias expansion (`*ref`).
const ALIAS_NODE_BUDGET: usize = 1_000_000;

fn decode_yaml(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let events = EventReader::new(text).map_err(|e| yaml_error(e.message, e.location))?;
    Composer {
        events,
        anchors: HashMap::new(),
        alias_budget: ALIAS_NODE_BUDGET,
        depth: 0,
    }
    .document()
}

fn yaml_error(message: impl std::fmt::Display, at: Location) -> ConvertError {
    ConvertError::decode_at(Format::Yaml, message, at)
}

/// Builds one [`Value`] from the event stream.
struct Composer<'input> {
    events: EventReader<'input>,
    anchors: HashMap<String, Anchored>,
    alias_budget: usize,
    depth: usize,
}

struct Anchored {
    value: Value,
    nodes: usize,
}

impl Composer<'_> {
    fn next(&mut self) -> Result<(Event, Location)> {
        self.events
            .next_event()
            .map_err(|e| yaml_error(e.message, e.location))
    }

    fn document(mut self) -> Result<Value> {
        let (event, at) = self.next()?;
        if !matches!(event, Event::StreamStart) {
            return Err(yaml_error("expected the start of a YAML stream", at));
        }
        let (event, at) = self.next()?;
        match event {
            Event::StreamEnd => return Ok(Value::Null),
            Event::DocumentStart => {}
            other => return Err(yaml_error(format!("unexpected {other:?}"), at)),
        }

        let (event, at) = self.next()?;
        let value = self.node(event, at)?;

        let (event, at) = self.next()?;
        if !matches!(event, Event::DocumentEnd) {
            return Err(yaml_error(format!("unexpected {event:?}"), at));
        }
        match self.next()? {
            (Event::StreamEnd, _) => Ok(value),
            (Event::DocumentStart, at) => Err(yaml_error(
                "multiple documents in one stream are not supported",
                at,
            )),
            (other, at) => Err(yaml_error(format!("unexpected {other:?}"), at)),
        }
    }

    fn node(&mut self, event: Event, at: Location) -> Result<Value> {
        match event {
            Event::Alias(name) => self.alias(&name, at),
            Event::Scalar(scalar) => {
                let value = resolve_scalar(&scalar).map_err(|message| yaml_error(message, at))?;
                self.remember(scalar.anchor, &value);
                Ok(value)
            }
            Event::SequenceStart(start) => {
                check_collection_tag(&start, "seq").map_err(|message| yaml_error(message, at))?;
                self.enter(at)?;
                let mut items = Vec::new();
                loop {
                    let (event, at) = self.next()?;
                    if matches!(event, Event::SequenceEnd) {
                        break;
                    }
                    items.push(self.node(event, at)?);
                }
                self.depth -= 1;
                let value = Value::Sequence(items);
                self.remember(start.anchor, &value);
                Ok(value)
            }
            Event::MappingStart(start) => {
                check_collection_tag(&start, "map").map_err(|message| yaml_error(message, at))?;
                self.enter(at)?;
                let value = self.mapping()?;
                self.depth -= 1;
                self.remember(start.anchor, &value);
                Ok(value)
            }
            other => Err(yaml_error(format!("unexpected {other:?}"), at)),
        }
    }

    /// Entries up to the closing event. Merged entries come first, in merge
    /// order; explicit keys override them in place.
    fn mapping(&mut self) -> Result<Value> {
        let mut merged: Vec<(Value, Value)> = Vec::new();
        let mut explicit: Vec<(Value, Value)> = Vec::new();
        loop {
            let (event, key_at) = self.next()?;
            if matches!(event, Event::MappingEnd) {
                break;
            }
            let merge = matches!(&event, Event::Scalar(scalar) if is_merge_key(scalar));
            let key = self.node(event, key_at)?;
            let (event, value_at) = self.next()?;
            let value = self.node(event, value_at)?;

            if merge {
                merge_into(&mut merged, value).map_err(|message| yaml_error(message, value_at))?;
            } else if explicit.iter().any(|(k, _)| *k == key) {
                return Err(yaml_error(format!("duplicate mapping key {key}"), key_at));
            } else {
                explicit.push((key, value));
            }
        }

        for (key, value) in explicit {
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }
        Ok(Value::Mapping(merged))
    }

    fn alias(&mut self, name: &str, at: Location) -> Result<Value> {
        let anchored = self
            .anchors
            .get(name)
            .ok_or_else(|| yaml_error(format!("unknown anchor {name:?}"), at))?;
        self.alias_budget = self
            .alias_budget
            .checked_sub(anchored.nodes)
            .ok_or_else(|| yaml_error("alias expansion exceeds the document size limit", at))?;
        Ok(anchored.value.clone())
    }

    fn remember(&mut self, anchor: Option<String>, value: &Value) {
        if let Some(anchor) = anchor {
            let anchored = Anchored {
                nodes: node_count(value),
                value: value.clone(),
            };
            self.anchors.insert(anchor, anchored);
        }
    }

    fn enter(&mut self, at: Location) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(yaml_error("document nesting is too deep", at));
        }
        Ok(())
    }
}

fn node_count(value: &Value) -> usize {
    match value {
        Value::Sequence(items) => 1 + items.iter().map(node_count).sum::<usize>(),
        Value::Mapping(entries) => {
            1 + entries
                .iter()
                .map(|(k, v)| node_count(k) + node_count(v))
                .sum::<usize>()
        }
        _ => 1,
    }
}

fn is_merge_key(scalar: &Scalar) -> bool {
    match scalar.tag.as_deref() {
        None => scalar.plain && scalar.value == "<<",
        Some(tag) => core_name(tag) == Some("merge"),
    }
}

/// Add the entries of a `<<` value. Keys already present win, so earlier
/// sources take precedence over later ones.
fn merge_into(merged: &mut Vec<(Value, Value)>, source: Value) -> std::result::Result<(), String> {
    match source {
        Value::Mapping(entries) => {
            for (key, value) in entries {
                if !merged.iter().any(|(k, _)| *k == key) {
                    merged.push((key, value));
                }
            }
            Ok(())
        }
        Value::Sequence(items) => {
            for item in items {
                if !item.is_mapping() {
                    return Err(format!("cannot merge a {} into a mapping", item.kind()));
                }
                merge_into(merged, item)?;
            }
            Ok(())
        }
        other => Err(format!("cannot merge a {} into a mapping", other.kind())),
    }
}

/// Name of a `tag:yaml.org,2002:` tag, i.e. what follows `!!`.
fn core_name(tag: &str) -> Option<&str> {
    tag.strip_prefix(CORE_TAG_PREFIX)
}

/// A tag the way it was most likely written in the source.
fn display_tag(tag: &str) -> String {
    match core_name(tag) {
        Some(name) => format!("!!{name}"),
        None => tag.to_string(),
    }
}

fn check_collection_tag(start: &NodeStart, expected: &str) -> std::result::Result<(), String> {
    let Some(tag) = start.tag.as_deref().filter(|tag| *tag != "!") else {
        return Ok(());
    };
    match core_name(tag) {
        Some(name) if name == expected => Ok(()),
        Some(name @ ("str" | "int" | "float" | "bool" | "null" | "timestamp" | "seq" | "map")) => {
            let found = if expected == "seq" { "sequence" } else { "mapping" };
            Err(format!("{found} value does not match tag !!{name}"))
        }
        _ => Err(format!("unsupported tag {}", display_tag(tag))),
    }
}

fn resolve_scalar(scalar: &Scalar) -> std::result::Result<Value, String> {
    let text = scalar.value.as_str();
    let Some(tag) = scalar.tag.as_deref() else {
        return Ok(if scalar.plain {
            resolve_plain(text)
        } else {
            Value::String(text.to_string())
        });
    };
    // The non-specific tag `!` pins a scalar to a string.
    if tag == "!" {
        return Ok(Value::String(text.to_string()));
    }
    let invalid = |name: &str| format!("invalid !!{name} value {text:?}");
    match core_name(tag) {
        Some("str") => Ok(Value::String(text.to_string())),
        Some("int") => parse_int(text)
            .map(Value::Integer)
            .ok_or_else(|| invalid("int")),
        Some("float") => parse_float(text)
            .map(Value::Float)
            .ok_or_else(|| invalid("float")),
        Some("bool") => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| invalid("bool")),
        Some("null") => is_null(text)
            .then_some(Value::Null)
            .ok_or_else(|| invalid("null")),
        Some("timestamp") => parse_timestamp(text)
            .map(Value::Timestamp)
            .ok_or_else(|| format!("invalid timestamp {text:?}")),
        Some(name @ ("seq" | "map")) => Err(format!("scalar value does not match tag !!{name}")),
        _ => Err(format!("unsupported tag {}", display_tag(tag))),
    }
}

/// Implicit type of an untagged plain scalar.
fn resolve_plain(text: &str) -> Value {
    if is_null(text) {
        Value::Null
    } else if let Some(b) = parse_bool(text) {
        Value::Bool(b)
    } else if let Some(i) = parse_int(text) {
        Value::Integer(i)
    } else if let Some(f) = parse_float(text).filter(|_| !zero_padded_digits(text)) {
        Value::Float(f)
    } else if let Some(ts) = parse_timestamp(text) {
        Value::Timestamp(ts)
    } else {
        Value::String(text.to_string())
    }
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// `0123` is a string in YAML 1.2, not an octal or decimal number.
fn zero_padded_digits(text: &str) -> bool {
    let digits = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    digits.len() > 1 && digits.starts_with('0') && digits[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Decimal, `0x` hex, `0o` octal or `0b` binary, optionally signed.
fn parse_int(text: &str) -> Option<i128> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(rest) = unsigned.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = unsigned.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = unsigned.strip_prefix("0b") {
        (2, rest)
    } else if zero_padded_digits(unsigned) {
        return None;
    } else {
        (10, unsigned)
    };
    if digits.is_empty() || digits.starts_with(&['+', '-'][..]) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    let unsigned = text.strip_prefix(&['+', '-'][..]).unwrap_or(text);
    if unsigned.starts_with(&['+', '-'][..]) {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// YAML 1.1 timestamp: a date, or a date and time with an optional zone.
fn timestamp_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{1,2})-(?P<day>[0-9]{1,2})(?:(?:[Tt]|[ \t]+)(?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})(?P<fraction>\.[0-9]*)?(?:[ \t]*(?P<zone>[Zz]|[-+][0-9]{1,2}(?::?[0-9]{2})?))?)?$",
        )
        .expect("timestamp pattern is valid")
    })
}

/// Parse a YAML timestamp into its TOML date-time form. Accepts RFC 3339 as
/// well as the looser YAML spelling `2001-12-14 21:59:43.10 -5` (space
/// separators, unpadded fields, short zone offsets).
fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let caps = timestamp_shape().captures(text.trim())?;
    let field = |name: &str| caps.name(name).map_or("", |m| m.as_str());
    let mut normalized = format!(
        "{}-{:0>2}-{:0>2}",
        field("year"),
        field("month"),
        field("day")
    );
    if caps.name("hour").is_some() {
        normalized.push_str(&format!(
            "T{:0>2}:{}:{}",
            field("hour"),
            field("minute"),
            field("second")
        ));
        if field("fraction").len() > 1 {
            normalized.push_str(field("fraction"));
        }
        normalized.push_str(&normalize_zone(field("zone")));
    }
    normalized.parse().ok()
}

/// `Z`, `+5`, `-05:30` or `+0530` → `Z`, `+05:00`, `-05:30`, `+05:30`.
fn normalize_zone(zone: &str) -> String {
    if zone.is_empty() || zone.eq_ignore_ascii_case("z") {
        return zone.to_ascii_uppercase();
    }
    let (sign, digits) = zone.split_at(1);
    let digits = digits.replace(':', "");
    let (hours, minutes) = if digits.len() > 2 {
        digits.split_at(digits.len() - 2)
    } else {
        (digits.as_str(), "00")
    };
    format!("{sign}{hours:0>2}:{minutes}")
}

// ── TOML ─────────────────────────────────────────────────────────────────────

fn decode_toml(text: &str) -> Result<Value> {
    let table: toml::Table = toml::from_str(text).map_err(|err| {
        match err.span().map(|span| location_at(text, span.start)) {
            Some(location) => ConvertError::decode_at(Format::Toml, err.message(), location),
            None => ConvertError::decode(Format::Toml, err.message()),
        }
    })?;
    Ok(from_toml_table(table))
}

fn location_at(text: &str, offset: usize) -> Location {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Location { line, column }
}

fn from_toml_table(table: toml::Table) -> Value {
    Value::Mapping(
        table
            .into_iter()
            .map(|(k, v)| (Value::String(k), from_toml(v)))
            .collect(),
    )
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i.into()),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::Timestamp(dt),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => from_toml_table(table),
    }
}

// ── JSON ─────────────────────────────────────────────────────────────────────

fn decode_json(text: &str) -> Result<Value> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| ConvertError::Decode {
            format: Format::Json,
            location: (err.line() > 0).then(|| Location {
                line: err.line(),
                column: err.column(),
            }),
            message: err.to_string(),
        })?;
    from_json(value)
}

fn from_json(value: serde_json::Value) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Integer(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(ConvertError::decode(
                    Format::Json,
                    format!("unrepresentable number {n}"),
                ));
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Sequence(
            items
                .into_iter()
                .map(from_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_json::Value::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map {
                entries.push((Value::String(k), from_json(v)?));
            }
            Value::Mapping(entries)
        }
    })
}
