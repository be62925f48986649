//! Tolerant accessors over loosely-typed records.
//!
//! Every accessor answers `None` when a field is missing, null, empty, or of
//! an unexpected type. Fallback chains are then plain ordered lists of
//! `Option`s fed to [`first_non_empty`].

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// First candidate that is present.
///
/// Candidates are already filtered for emptiness by the accessors that
/// produce them.
pub fn first_non_empty<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// Read-only view over a raw record. Non-object input behaves as an empty
/// record.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    pub fn of(map: &'a Map<String, Value>) -> Self {
        Self { map: Some(map) }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map?.get(key).filter(|v| !v.is_null())
    }

    /// Non-blank string.
    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key)?
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    }

    /// Identifier: a non-blank string, or a number rendered as a string.
    pub fn id(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::Number(n) => Some(n.to_string()),
            _ => self.text(key),
        }
    }

    /// Non-empty object.
    pub fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.raw(key)?.as_object().filter(|m| !m.is_empty())
    }

    pub fn array(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.raw(key)?.as_array().filter(|a| !a.is_empty())
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.raw(key)?.as_bool()
    }

    /// Number, or a string holding one.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.raw(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Non-negative integer that fits in `u32`.
    pub fn count(&self, key: &str) -> Option<u32> {
        self.raw(key)?.as_u64().and_then(|n| u32::try_from(n).ok())
    }

    /// Timestamp as an RFC 3339 string.
    ///
    /// Strings pass through unchanged; numbers are read as Unix seconds,
    /// fractional parts included.
    pub fn timestamp(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::Number(n) => match n.as_i64() {
                Some(secs) => DateTime::<Utc>::from_timestamp(secs, 0),
                None => n.as_f64().and_then(epoch_float),
            }
            .map(|dt| dt.to_rfc3339()),
            _ => self.text(key),
        }
    }
}

fn epoch_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let secs = value.floor();
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    let nanos = ((value - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
}
