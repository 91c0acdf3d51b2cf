//! Decoding of the NFZ JSON response envelopes.
//!
//! Each stage gets one decode function returning a tagged result instead of
//! scattered key-presence conditionals, so shape failures are handled
//! exhaustively at the call site.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("missing '{key}' key in API response; got keys: {present:?}")]
    MissingKey { key: String, present: Vec<String> },

    #[error("empty 'data' in API response")]
    EmptyData,

    #[error("missing '{column}' column in API response; available columns: {present:?}")]
    MissingColumn {
        column: String,
        present: Vec<String>,
    },
}

/// Stage 1: benefit codes, in list order.
///
/// Requires a `data` key, a non-empty array under it, and a `code` member on
/// the items.
pub fn decode_benefits(body: &Value) -> Result<Vec<String>, EnvelopeError> {
    let data = require_key(body, "data")?;
    let items = data.as_array().ok_or(EnvelopeError::EmptyData)?;
    if items.is_empty() {
        return Err(EnvelopeError::EmptyData);
    }

    let codes: Vec<String> = items
        .iter()
        .filter_map(|item| item.get("code").and_then(scalar_to_string))
        .collect();
    if codes.is_empty() {
        return Err(EnvelopeError::MissingColumn {
            column: "code".to_string(),
            present: column_union(items),
        });
    }
    Ok(codes)
}

/// Stage 2: link rows for a benefit's year-indexed table.
///
/// Extracts `data.attributes.years[0].tables` and strips the
/// presentation-only `attributes` and `links` members from each row.
pub fn decode_table_index(body: &Value) -> Result<Vec<Value>, EnvelopeError> {
    let data = require_key(body, "data")?;
    let tables = data
        .get("attributes")
        .and_then(|v| v.get("years"))
        .and_then(|v| v.as_array())
        .and_then(|years| years.first())
        .and_then(|year| year.get("tables"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| EnvelopeError::MissingKey {
            key: "data.attributes.years[0].tables".to_string(),
            present: object_keys(data),
        })?;

    Ok(tables
        .iter()
        .map(|row| strip_members(row, &["attributes", "links"]))
        .collect())
}

/// Stage 3: disease rows for one table link.
///
/// Extracts `data.attributes.data` and drops the incidental table-id
/// identifier columns.
pub fn decode_diseases(body: &Value) -> Result<Vec<Value>, EnvelopeError> {
    let data = require_key(body, "data")?;
    let rows = data
        .get("attributes")
        .and_then(|v| v.get("data"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| EnvelopeError::MissingKey {
            key: "data.attributes.data".to_string(),
            present: object_keys(data),
        })?;

    Ok(rows
        .iter()
        .map(|row| strip_members(row, &["table-id", "table_id", "tableid"]))
        .collect())
}

/// Renders a scalar cell as text; table links carry ids as either strings or
/// numbers depending on the endpoint.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn require_key<'a>(body: &'a Value, key: &str) -> Result<&'a Value, EnvelopeError> {
    body.get(key).ok_or_else(|| EnvelopeError::MissingKey {
        key: key.to_string(),
        present: object_keys(body),
    })
}

fn object_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}

fn column_union(items: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = items.iter().flat_map(object_keys).collect();
    columns.sort();
    columns.dedup();
    columns
}

fn strip_members(row: &Value, dropped: &[&str]) -> Value {
    match row {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !dropped.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
