//! Result envelope of mutating calls (approve, reject, enable, disable, delete).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page::error_message;
use crate::Error;

/// Outcome of a mutating call (approve, reject, enable, disable, delete, ...).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ActionResponse {
    /// Interprets a 2xx response body.
    ///
    /// Empty bodies and non-envelope bodies (e.g. the updated record) count as
    /// success. An explicit `ok: false` becomes [`Error::Rejected`].
    pub fn from_body(body: &str) -> Result<Self, Error> {
        if body.trim().is_empty() {
            return Ok(Self::accepted());
        }
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::Malformed(format!("action response: {}", e)))?;
        let Value::Object(map) = value else {
            return Ok(Self::accepted());
        };
        let ok = map
            .get("ok")
            .or_else(|| map.get("success"))
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if !ok {
            return Err(Error::Rejected(error_message(&map)));
        }
        Ok(Self {
            ok,
            message: map.get("message").and_then(Value::as_str).map(str::to_string),
            error: None,
        })
    }

    fn accepted() -> Self {
        Self {
            ok: true,
            message: None,
            error: None,
        }
    }
}
