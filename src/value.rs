// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::record::Record;

use core::fmt;

use anyhow::{anyhow, Result};
use serde::ser::{Serialize, Serializer};

/// Result of evaluating a path query against a [`Record`].
///
/// Attribute values are stored as text and coerced when read: text that
/// parses fully as a finite float becomes [`Value::Number`], everything else
/// stays a [`Value::String`]. Element matches are returned as
/// [`Value::Record`] views. `Undefined` is the usual default for a query that
/// matched nothing.
#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    Number(f64),
    String(&'a str),
    Record(Record<'a>),

    // Indicate that a value is undefined
    Undefined,
}

/// Parse attribute text as a number.
///
/// Surrounding whitespace is ignored. Spellings that Rust's float grammar
/// accepts but that do not denote a finite number (`inf`, `NaN`, overflow)
/// are treated as non-numeric.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Coerce raw attribute text into a scalar [`Value`].
pub fn coerce(raw: &str) -> Value<'_> {
    match parse_number(raw) {
        Some(n) => Value::Number(n),
        None => Value::String(raw),
    }
}

impl<'a> Value<'a> {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(anyhow!("not a number")),
        }
    }

    pub fn as_string(&self) -> Result<&'a str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(anyhow!("not a string")),
        }
    }

    pub fn as_record(&self) -> Result<Record<'a>> {
        match self {
            Value::Record(r) => Ok(*r),
            _ => Err(anyhow!("not a record")),
        }
    }

    /// The numeric value, if this is a number.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The record, if this is an element match.
    pub fn to_record(&self) -> Option<Record<'a>> {
        match self {
            Value::Record(r) => Some(*r),
            _ => None,
        }
    }

    /// Replace `Undefined` with `default`.
    pub fn or(self, default: Value<'a>) -> Value<'a> {
        match self {
            Value::Undefined => default,
            v => v,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(s)
    }
}

impl<'a> From<Record<'a>> for Value<'a> {
    fn from(r: Record<'a>) -> Self {
        Value::Record(r)
    }
}

/// Serialize a float the way the JSON output expects: integral values are
/// written without a fractional part.
pub(crate) fn serialize_number<S>(n: f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // 2^53: beyond this f64 cannot represent every integer.
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < EXACT_LIMIT {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

impl Serialize for Value<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Number(n) => serialize_number(*n, serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Record(r) => r.serialize(serializer),
            Value::Undefined => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{s}"),
            Err(_e) => Err(fmt::Error),
        }
    }
}
