//! JSON decoding of newsletter responses.
//!
//! # Design
//! Bodies are parsed into a `serde_json::Value` first. Object keys written in
//! snake, kebab or Pascal case are rewritten to camelCase and `null` entries
//! are dropped, then serde maps the value onto the target entity. This keeps
//! the entity derives simple while tolerating the service's inconsistent key
//! spelling and its `null`s for unset fields.
//!
//! The service writes dates as `YYYY-MM-DD|HH:mm:ss`. A date that does not
//! parse decodes as absent instead of failing the whole response.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use convert_case::{Case, Casing};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::types::Collection;

/// Decode a single entity. An empty or `null` body yields `None`.
pub fn decode_entity<T: DeserializeOwned>(body: &str) -> Result<Option<T>, DecodeError> {
    let Some(value) = parse_body(body)? else {
        return Ok(None);
    };
    if !value.is_object() {
        return Err(DecodeError::UnexpectedShape {
            expected: "object",
            found: value_kind(&value),
        });
    }
    Ok(Some(serde_json::from_value(normalize_keys(value)).map_err(DecodeError::Mismatch)?))
}

/// Decode an array of entities, keeping the order of the array. An empty or
/// `null` body yields an empty collection.
pub fn decode_collection<T: DeserializeOwned>(body: &str) -> Result<Collection<T>, DecodeError> {
    let Some(value) = parse_body(body)? else {
        return Ok(Collection::default());
    };
    let Value::Array(items) = value else {
        return Err(DecodeError::UnexpectedShape {
            expected: "array",
            found: value_kind(&value),
        });
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(normalize_keys(item)).map_err(DecodeError::Mismatch))
        .collect()
}

fn parse_body(body: &str) -> Result<Option<Value>, DecodeError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(body).map_err(DecodeError::Syntax)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_camel_case(key: &str) -> bool {
    !key.contains(['_', '-', ' ']) && !key.starts_with(|c: char| c.is_ascii_uppercase())
}

/// Rewrite object keys to camelCase and drop `null` entries, recursively. A
/// key already spelled in camelCase wins over a differently spelled duplicate,
/// compared ignoring ASCII case.
fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut normalized = Map::with_capacity(map.len());
            let mut pending = Vec::new();
            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                if is_camel_case(&key) {
                    normalized.insert(key, normalize_keys(value));
                } else {
                    pending.push((key.to_case(Case::Camel), value));
                }
            }
            for (key, value) in pending {
                if !normalized.keys().any(|existing| existing.eq_ignore_ascii_case(&key)) {
                    normalized.insert(key, normalize_keys(value));
                }
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Parse the service's `YYYY-MM-DD|HH:mm:ss` timestamps. Any single character
/// is accepted as the date/time separator.
pub fn parse_service_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let date = raw.get(..10)?;
    let mut rest = raw.get(10..)?.chars();
    rest.next()?;
    let time = rest.as_str();

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    Some(NaiveDateTime::new(date, time))
}

/// Serde adapter for date fields: unparsable, empty or non-string values
/// become `None`.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match &value {
        Some(Value::String(raw)) if !raw.is_empty() => {
            let parsed = parse_service_datetime(raw);
            if parsed.is_none() {
                tracing::debug!(raw = %raw, "ignoring malformed date");
            }
            parsed
        }
        _ => None,
    };
    Ok(parsed)
}
