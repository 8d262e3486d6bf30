// ============================================================================
// API CLIENT - authenticated requests against the dashboard backend
// ============================================================================
// Built once by the composition root and passed around; there is no global
// instance. Before each request the current session token is attached as
// a bearer header; failed responses are normalized into `ApiError`.
// ============================================================================

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::services::api_error::{normalize_error, ApiError, RawFailure};
use crate::services::transport::{
    FetchTransport, HttpMethod, PreparedRequest, RawResponse, RequestBody, ResponseBody,
    ResponseType, Transport,
};
use crate::state::SessionHandle;
use crate::utils::QueryParams;

/// One call, before interceptors run
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: HttpMethod,
    /// Relative to the base URL, or absolute
    pub url: String,
    pub params: QueryParams,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub response_type: ResponseType,
}

impl RequestConfig {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: QueryParams::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            response_type: ResponseType::Json,
        }
    }

    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Serialize(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }

    pub fn binary(mut self) -> Self {
        self.response_type = ResponseType::Binary;
        self
    }

    /// Sets a header, replacing any existing one with the same name
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
    }
}

pub struct ApiClient<T: Transport = FetchTransport> {
    base_url: String,
    transport: T,
    session: SessionHandle,
}

impl ApiClient<FetchTransport> {
    pub fn new(config: &AppConfig, session: SessionHandle) -> Self {
        Self::with_transport(&config.api_base_url, FetchTransport, session)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(base_url: &str, transport: T, session: SessionHandle) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Adds `Authorization: Bearer <token>` when logged in; other headers
    /// are left alone.
    fn authorize(&self, config: &mut RequestConfig) {
        let session = self.session.borrow();
        if session.is_logged_in() {
            if let Some(token) = session.token() {
                config.set_header("Authorization", format!("Bearer {}", token));
            }
        }
    }

    fn resolve_url(&self, url: &str, params: &QueryParams) -> String {
        let mut full = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        };
        if !params.is_empty() {
            full.push(if full.contains('?') { '&' } else { '?' });
            full.push_str(&params.to_query_string());
        }
        full
    }

    /// Runs the interceptors and builds what goes on the wire
    pub fn prepare(&self, mut config: RequestConfig) -> PreparedRequest {
        self.authorize(&mut config);
        PreparedRequest {
            method: config.method,
            url: self.resolve_url(&config.url, &config.params),
            headers: config.headers,
            body: config.body,
            response_type: config.response_type,
        }
    }

    /// Sends the request; 2xx responses come back untouched.
    pub async fn request(&self, config: RequestConfig) -> Result<RawResponse, ApiError> {
        // the session borrow ends inside prepare, before the await
        let prepared = self.prepare(config);
        log::debug!("🌐 {:?} {}", prepared.method, prepared.url);

        match self.transport.send(prepared).await {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(normalize_error(RawFailure::Status(response))),
            Err(failure) => Err(normalize_error(RawFailure::Transport(failure))),
        }
    }

    pub async fn request_json<R: DeserializeOwned>(&self, config: RequestConfig) -> Result<R, ApiError> {
        let response = self.request(config).await?;
        decode_body(response.body)
    }

    pub async fn get<R: DeserializeOwned>(&self, url: &str, params: QueryParams) -> Result<R, ApiError> {
        self.request_json(RequestConfig::new(HttpMethod::Get, url).params(params))
            .await
    }

    pub async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_json(RequestConfig::new(HttpMethod::Post, url).json(body)?)
            .await
    }

    pub async fn put<B, R>(&self, url: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_json(RequestConfig::new(HttpMethod::Put, url).json(body)?)
            .await
    }

    pub async fn delete<R: DeserializeOwned>(&self, url: &str) -> Result<R, ApiError> {
        self.request_json(RequestConfig::new(HttpMethod::Delete, url))
            .await
    }

    /// Binary GET (reports, exports)
    pub async fn download(&self, url: &str, params: QueryParams) -> Result<Vec<u8>, ApiError> {
        let config = RequestConfig::new(HttpMethod::Get, url).params(params).binary();
        match self.request(config).await?.body {
            ResponseBody::Binary(bytes) => Ok(bytes),
            ResponseBody::Text(text) => Ok(text.into_bytes()),
            ResponseBody::Json(value) => Ok(value.to_string().into_bytes()),
            ResponseBody::Empty => Ok(Vec::new()),
        }
    }
}

fn decode_body<R: DeserializeOwned>(body: ResponseBody) -> Result<R, ApiError> {
    let parsed = match body {
        ResponseBody::Json(value) => serde_json::from_value(value),
        ResponseBody::Empty => serde_json::from_value(Value::Null),
        ResponseBody::Text(text) => serde_json::from_value(Value::String(text)),
        ResponseBody::Binary(bytes) => serde_json::from_slice(&bytes),
    };
    parsed.map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::token::tests::make_token;
    use crate::services::transport::TransportFailure;
    use crate::state::UserSession;
    use crate::utils::MemoryStorage;
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays canned responses and records what was sent
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<RawResponse, TransportFailure>>>,
        pub(crate) sent: RefCell<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn reply(self, reply: Result<RawResponse, TransportFailure>) -> Self {
            self.replies.borrow_mut().push_back(reply);
            self
        }

        pub(crate) fn json(self, status: u16, body: Value) -> Self {
            self.reply(Ok(RawResponse {
                status,
                content_type: Some("application/json".into()),
                body: ResponseBody::Json(body),
            }))
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportFailure> {
            self.sent.borrow_mut().push(request);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::network("no scripted reply")))
        }
    }

    pub(crate) fn logged_out_session() -> SessionHandle {
        UserSession::load(Rc::new(MemoryStorage::new())).into_handle()
    }

    fn client(transport: ScriptedTransport, session: SessionHandle) -> ApiClient<ScriptedTransport> {
        ApiClient::with_transport("http://api.test/api/v1/", transport, session)
    }

    #[test]
    fn bearer_header_added_when_logged_in() {
        let session = logged_out_session();
        let token = make_token(&json!({ "sub": "1" }));
        session.borrow_mut().set_token(Some(token.clone())).unwrap();
        let api = client(ScriptedTransport::default(), session);

        let prepared = api.prepare(
            RequestConfig::new(HttpMethod::Get, "/cameras")
                .header("Accept-Language", "en"),
        );
        assert_eq!(prepared.header("Authorization"), Some(format!("Bearer {}", token).as_str()));
        assert_eq!(prepared.header("Accept-Language"), Some("en"));
        assert_eq!(prepared.url, "http://api.test/api/v1/cameras");
    }

    #[test]
    fn no_auth_header_when_logged_out() {
        let api = client(ScriptedTransport::default(), logged_out_session());
        let prepared = api.prepare(RequestConfig::new(HttpMethod::Get, "cameras").header("X-Trace", "1"));
        assert_eq!(prepared.header("Authorization"), None);
        assert_eq!(prepared.headers, vec![("X-Trace".to_string(), "1".to_string())]);
    }

    #[test]
    fn token_is_read_at_send_time() {
        let session = logged_out_session();
        let api = client(ScriptedTransport::default(), session.clone());
        let before = api.prepare(RequestConfig::new(HttpMethod::Get, "users/me"));
        session.borrow_mut().set_token(Some("t2".into())).unwrap();
        let after = api.prepare(RequestConfig::new(HttpMethod::Get, "users/me"));
        assert_eq!(before.header("Authorization"), None);
        assert_eq!(after.header("Authorization"), Some("Bearer t2"));
    }

    #[test]
    fn list_params_repeat_keys() {
        let api = client(ScriptedTransport::default(), logged_out_session());
        let prepared = api.prepare(
            RequestConfig::new(HttpMethod::Get, "incidents")
                .params(QueryParams::new().push_all("tags", ["a", "b"])),
        );
        assert_eq!(prepared.url, "http://api.test/api/v1/incidents?tags=a&tags=b");
    }

    #[test]
    fn absolute_urls_bypass_the_base() {
        let api = client(ScriptedTransport::default(), logged_out_session());
        let prepared = api.prepare(
            RequestConfig::new(HttpMethod::Get, "https://cdn.test/frame.jpg?v=2")
                .params(QueryParams::new().push("w", 640)),
        );
        assert_eq!(prepared.url, "https://cdn.test/frame.jpg?v=2&w=640");
    }

    #[test]
    fn success_passes_through() {
        let transport = ScriptedTransport::default().json(200, json!([{ "id": 1 }, { "id": 2 }]));
        let api = client(transport, logged_out_session());
        let cameras: Vec<Value> = block_on(api.get("cameras", QueryParams::new())).unwrap();
        assert_eq!(cameras.len(), 2);
    }

    #[test]
    fn post_sends_json_body() {
        let transport = ScriptedTransport::default().json(200, json!({ "id": 9, "name": "Gate" }));
        let api = client(transport, logged_out_session());
        let created: Value = block_on(api.post("cameras", &json!({ "name": "Gate" }))).unwrap();
        assert_eq!(created["id"], 9);

        let sent = api.transport().sent.borrow();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].body, RequestBody::Json(json!({ "name": "Gate" })));
    }

    #[test]
    fn validation_failure_is_normalized() {
        let transport = ScriptedTransport::default().json(
            422,
            json!({ "detail": [{ "loc": ["body", "email"], "msg": "value is not a valid email address" }] }),
        );
        let api = client(transport, logged_out_session());
        let err = block_on(api.put::<_, Value>("users/me", &json!({ "email": "nope" }))).unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(
            err.envelope().unwrap().field_error("email").as_deref(),
            Some("value is not a valid email address")
        );
    }

    #[test]
    fn network_failure_is_just_the_message() {
        let transport = ScriptedTransport::default().reply(Err(TransportFailure::network("Failed to fetch")));
        let api = client(transport, logged_out_session());
        let err = block_on(api.delete::<Value>("cameras/3")).unwrap_err();
        assert_eq!(err, ApiError::Transport("Network Error".into()));
    }

    #[test]
    fn download_returns_bytes_and_decodes_json_errors() {
        let transport = ScriptedTransport::default()
            .reply(Ok(RawResponse {
                status: 200,
                content_type: Some("application/pdf".into()),
                body: ResponseBody::Binary(b"%PDF-1.7".to_vec()),
            }))
            .reply(Ok(RawResponse {
                status: 404,
                content_type: Some("application/json".into()),
                body: ResponseBody::Binary(br#"{"detail": "Report not found"}"#.to_vec()),
            }));
        let api = client(transport, logged_out_session());

        let pdf = block_on(api.download("reports/1/pdf", QueryParams::new())).unwrap();
        assert_eq!(pdf, b"%PDF-1.7");
        assert_eq!(api.transport().sent.borrow()[0].response_type, ResponseType::Binary);

        let err = block_on(api.download("reports/2/pdf", QueryParams::new())).unwrap_err();
        assert_eq!(err.envelope().unwrap().get("detail"), Some(&json!("Report not found")));
    }

    #[test]
    fn unexpected_success_body_is_a_parse_error() {
        let transport = ScriptedTransport::default().json(200, json!({ "id": "x" }));
        let api = client(transport, logged_out_session());
        let err = block_on(api.get::<Vec<u32>>("cameras", QueryParams::new())).unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
