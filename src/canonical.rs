//! Deterministic, byte-exact serialization of values to a hashable octet
//! string (RFC 8785 / RFC 7159 canonical-JSON flavored).
//!
//! Object keys are sorted lexicographically by code point, output is
//! compact UTF-8 with no whitespace, integers carry no trailing decimal,
//! `-0` normalizes to `0`, and NaN/Infinity are rejected.

use crate::error::{AuditError, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A canonicalizable value. Distinct from `serde_json::Value` so that
/// integer/float distinction and NaN/Infinity are representable and
/// checkable — `serde_json::Value` cannot hold a NaN at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn object(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Object(pairs.into_iter().collect())
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Convert an arbitrary `serde_json::Value` into our canonicalizable
/// `Value`, coercing anything that isn't representable (there is nothing
/// a valid `serde_json::Value` can't represent, so this conversion never
/// needs the "coerce to string" fallback spec.md describes for foreign
/// types — that fallback exists for callers who hand in values from a
/// dynamically typed host, which this crate's typed `Event` never does).
impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::Array(arr.iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            }
        }
    }
}

/// Canonicalize a value to its deterministic byte-string form.
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out.into_bytes())
}

fn write_value(value: &Value, out: &mut String) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Integer(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => write_float(*f, out)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // `BTreeMap` already iterates in ascending key order, which for
            // `String` keys is lexicographic by Unicode code point.
            out.push('{');
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(k, out);
                out.push(':');
                write_value(v, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_float(f: f64, out: &mut String) -> Result<()> {
    if f.is_nan() || f.is_infinite() {
        return Err(AuditError::CanonicalizationError(
            "NaN and Infinity are not representable in canonical JSON".to_string(),
        ));
    }
    // Normalize -0.0 to 0.0 before formatting.
    let f = if f == 0.0 { 0.0 } else { f };
    if f.fract() == 0.0 && f.abs() < 1e15 {
        let _ = write!(out, "{}", f as i64);
    } else {
        let _ = write!(out, "{f}");
    }
    Ok(())
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
