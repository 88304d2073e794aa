use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

/// Parse a response body as JSON without serde_json's nesting limit.
///
/// Category trees may nest arbitrarily deep; the stack grows on demand
/// instead of failing the whole section.
pub fn parse_body(endpoint: &str, bytes: &[u8]) -> CatalogResult<Value> {
    let mut json = serde_json::Deserializer::from_slice(bytes);
    json.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut json))
        .map_err(|e| CatalogError::malformed(endpoint, e.to_string()))?;
    json.end().map_err(|e| CatalogError::malformed(endpoint, e.to_string()))?;
    Ok(value)
}

/// Pull the record array out of a response body.
///
/// Accepts a bare array, `{ "data": [...] }` and `{ "success": true, "data": [...] }`.
/// Anything else, including `success: false`, is a malformed response.
pub fn unwrap_records(endpoint: &str, body: Value) -> CatalogResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(Value::Bool(false)) = map.get("success") {
                return Err(CatalogError::malformed(endpoint, "success is false"));
            }
            match map.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Err(CatalogError::malformed(
                    endpoint,
                    format!("data is {}, not an array", kind_of(&other)),
                )),
                None => Err(CatalogError::malformed(endpoint, "missing data field")),
            }
        }
        other => Err(CatalogError::malformed(
            endpoint,
            format!("expected array or object, got {}", kind_of(&other)),
        )),
    }
}

/// Decode each record on its own, skipping (and logging) the ones that do not fit.
pub fn decode_each<T: DeserializeOwned>(endpoint: &str, records: Vec<Value>) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value(record) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(endpoint, index = i, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!(endpoint, kept = decoded.len(), total, "some records were skipped");
    }
    decoded
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
