// ============================================================================
// API ERROR - normalization of failed requests
// ============================================================================
// Every failed call ends up as one of:
//   - Response: the server answered with a non-2xx status
//   - Transport: nothing came back (only the message is kept)
// Validation failures (422 with a `detail` list) also get a `fields` map
// keyed by dotted field path, ready for form display.
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::services::transport::{RawResponse, ResponseBody, TransportFailure};
use crate::utils::{DEFAULT_FIELD_ERROR, VALIDATION_ERROR_STATUS};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Response(ErrorEnvelope),
    #[error("{0}")]
    Transport(String),
    #[error("could not decode error body: {0}")]
    Decode(String),
    #[error("could not serialize request: {0}")]
    Serialize(String),
    #[error("unexpected response body: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Response(envelope) => Some(envelope.status()),
            _ => None,
        }
    }

    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            ApiError::Response(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Per-field messages of a validation failure
    pub fn fields(&self) -> Option<BTreeMap<String, String>> {
        self.envelope().and_then(ErrorEnvelope::fields)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Error body handed to callers: `{status, message, fields, ...data}`.
///
/// Keys of the server body are spread last, so a server `message` or
/// `detail` wins over the generated one. `status()` always reports the
/// HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    status: u16,
    body: Map<String, Value>,
}

impl ErrorEnvelope {
    pub fn new(
        status: u16,
        message: &str,
        fields: Option<BTreeMap<String, String>>,
        data: Value,
    ) -> Self {
        let mut body = Map::new();
        body.insert("status".into(), json!(status));
        body.insert("message".into(), json!(message));
        body.insert("fields".into(), json!(fields));
        if let Value::Object(extra) = data {
            body.extend(extra);
        }
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    pub fn fields(&self) -> Option<BTreeMap<String, String>> {
        serde_json::from_value(self.body.get("fields")?.clone()).ok()
    }

    pub fn field_error(&self, path: &str) -> Option<String> {
        self.fields()?.remove(path)
    }

    /// Any key of the spread body (`detail`, `code`, ...)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// `{"error": {...}}`, the shape UI failure handlers consume
    pub fn to_value(&self) -> Value {
        json!({ "error": Value::Object(self.body.clone()) })
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "HTTP {}: {}", self.status, message),
            None => write!(f, "HTTP {}", self.status),
        }
    }
}

/// What the transport gave back for a failed call
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    Status(RawResponse),
    Transport(TransportFailure),
}

pub fn status_message(status: u16) -> String {
    format!("Request failed with status code {}", status)
}

pub fn normalize_error(failure: RawFailure) -> ApiError {
    let response = match failure {
        RawFailure::Status(response) => response,
        RawFailure::Transport(failure) => {
            return ApiError::Transport(failure.message.unwrap_or(failure.detail));
        }
    };

    let status = response.status;
    let message = status_message(status);
    let data = match response_data(&response) {
        Ok(data) => data,
        Err(e) => return ApiError::Decode(e),
    };

    let fields = if status == VALIDATION_ERROR_STATUS {
        data.get("detail")
            .and_then(Value::as_array)
            .map(|detail| validation_fields(detail))
    } else {
        None
    };

    let envelope = ErrorEnvelope::new(status, &message, fields, data);
    log::warn!("❌ {}", envelope);
    ApiError::Response(envelope)
}

/// Body of a failed response as JSON. Binary bodies declared as JSON are
/// decoded here since binary mode skips the usual parsing.
fn response_data(response: &RawResponse) -> Result<Value, String> {
    match &response.body {
        ResponseBody::Empty => Ok(Value::Object(Map::new())),
        ResponseBody::Json(value) => Ok(value.clone()),
        ResponseBody::Text(text) => Ok(Value::String(text.clone())),
        ResponseBody::Binary(bytes) if response.is_json() => {
            let text = String::from_utf8_lossy(bytes);
            serde_json::from_str(&text).map_err(|e| e.to_string())
        }
        // opaque payload, nothing to spread
        ResponseBody::Binary(_) => Ok(Value::Object(Map::new())),
    }
}

/// `[{"loc": ["body", "a", "b"], "msg": "m"}]` -> `{"a.b": "m"}`.
///
/// The first `loc` segment names where the value came from (body, query)
/// and is dropped. Later entries win on duplicate paths; entries without a
/// `loc` list are skipped.
pub fn validation_fields(detail: &[Value]) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for entry in detail {
        let Some(loc) = entry.get("loc").and_then(Value::as_array) else {
            continue;
        };
        let path = loc
            .iter()
            .skip(1)
            .map(|segment| match segment {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".");
        let msg = entry
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FIELD_ERROR);
        fields.insert(path, msg.to_string());
    }
    fields
}
