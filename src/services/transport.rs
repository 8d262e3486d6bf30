// ============================================================================
// TRANSPORT - one HTTP round trip, nothing else
// ============================================================================
// Non-2xx responses are returned as `Ok`; deciding what is a failure is the
// client's job. `Err` means no response was received at all.
// ============================================================================

use gloo_net::http::{Method, RequestBuilder};
use serde_json::Value;

use crate::utils::query::encode_pairs;
use crate::utils::NETWORK_ERROR_MESSAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// How the response body should be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Json,
    /// Raw bytes (file downloads); error bodies arrive undecoded too
    Binary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Request after interceptors ran and the URL was resolved
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub response_type: ResponseType,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// JSON when the text parses, plain text otherwise
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the declared media type is `application/json`, ignoring
    /// parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
    }
}

/// No response came back (network, CORS, aborted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: Option<String>,
    /// Underlying error text, used when there is no message
    pub detail: String,
}

impl TransportFailure {
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            message: Some(NETWORK_ERROR_MESSAGE.to_string()),
            detail: detail.into(),
        }
    }
}

impl From<gloo_net::Error> for TransportFailure {
    fn from(e: gloo_net::Error) -> Self {
        Self {
            message: None,
            detail: e.to_string(),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure>;
}

/// Browser `fetch` through gloo-net
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure> {
        let mut builder = RequestBuilder::new(&request.url).method(request.method.into());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let built = match request.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => builder
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(encode_pairs(&pairs)),
        }?;

        let response = built.send().await.map_err(|e| {
            log::warn!("🌐 {:?} {} failed: {}", request.method, request.url, e);
            TransportFailure::network(e.to_string())
        })?;

        let status = response.status();
        let content_type = response.headers().get("content-type");
        let body = match request.response_type {
            ResponseType::Binary => ResponseBody::Binary(response.binary().await?),
            ResponseType::Json => ResponseBody::from_text(response.text().await?),
        };

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
