//! Normalization of list and detail envelopes.
//!
//! Backend services answer list calls with one of several shapes: a bare
//! array, an `{ok, data, error}` status envelope, an `{items, total}` object,
//! or a `{meta: {paging}, data}` paginated object. [`Page::from_value`]
//! collapses all of them into `rows + total`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Keys that may hold the row collection, in lookup order.
const COLLECTION_KEYS: &[&str] = &["items", "rows", "data", "results"];

/// One page of rows plus the backend's total match count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Count of all matching rows across pages. Falls back to `rows.len()`
    /// when the backend does not report one.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total: u64) -> Self {
        Self { rows, total }
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Normalizes any supported list envelope into a page.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Array(items) => {
                let rows = decode_rows(items)?;
                let total = rows.len() as u64;
                Ok(Page { rows, total })
            }
            Value::Object(mut map) => {
                if let Some(ok) = map.get("ok").and_then(Value::as_bool) {
                    if !ok {
                        return Err(Error::Rejected(error_message(&map)));
                    }
                    let total = read_total(&map);
                    let data = map.remove("data").unwrap_or(Value::Array(Vec::new()));
                    let mut page = Self::from_value(data)?;
                    if let Some(total) = total {
                        page.total = total;
                    }
                    return Ok(page);
                }

                let total = read_total(&map);
                for key in COLLECTION_KEYS {
                    match map.remove(*key) {
                        Some(Value::Array(items)) => {
                            let rows = decode_rows(items)?;
                            let total = total.unwrap_or(rows.len() as u64);
                            return Ok(Page { rows, total });
                        }
                        Some(nested @ Value::Object(_)) => {
                            let mut page = Self::from_value(nested)?;
                            if let Some(total) = total {
                                page.total = total;
                            }
                            return Ok(page);
                        }
                        Some(other) => {
                            return Err(Error::Malformed(format!(
                                "`{}` is not a collection: {}",
                                key,
                                type_name(&other)
                            )))
                        }
                        None => continue,
                    }
                }
                Err(Error::Malformed(
                    "response holds no row collection".to_string(),
                ))
            }
            other => Err(Error::Malformed(format!(
                "expected an array or object, got {}",
                type_name(&other)
            ))),
        }
    }
}

/// Strips a `{ok, data}` or `{data}` envelope from a detail response.
///
/// A bare object is returned as-is. An object is only treated as an envelope
/// when it carries `ok` or consists solely of `data`/`meta`, so records that
/// happen to own a `data` field survive.
pub fn unwrap_detail(value: Value) -> Result<Value, Error> {
    match value {
        Value::Object(mut map) => {
            if let Some(ok) = map.get("ok").and_then(Value::as_bool) {
                if !ok {
                    return Err(Error::Rejected(error_message(&map)));
                }
                return map
                    .remove("data")
                    .ok_or_else(|| Error::Malformed("envelope without `data`".to_string()));
            }
            let envelope_only = map.contains_key("data")
                && map.keys().all(|k| k == "data" || k == "meta");
            if envelope_only {
                return map
                    .remove("data")
                    .ok_or_else(|| Error::Malformed("envelope without `data`".to_string()));
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

fn decode_rows<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, Error> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item)
                .map_err(|e| Error::Malformed(format!("row {}: {}", idx, e)))
        })
        .collect()
}

fn read_total(map: &Map<String, Value>) -> Option<u64> {
    for key in ["total", "total_count", "totalCount", "count"] {
        if let Some(total) = map.get(key).and_then(Value::as_u64) {
            return Some(total);
        }
    }
    let meta = map.get("meta")?;
    meta.pointer("/paging/totalItems")
        .or_else(|| meta.get("total"))
        .and_then(Value::as_u64)
}

pub(crate) fn error_message(map: &Map<String, Value>) -> String {
    map.get("error")
        .or_else(|| map.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("request rejected")
        .to_string()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
