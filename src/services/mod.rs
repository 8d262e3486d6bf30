pub mod api_client;
pub mod api_error;
pub mod auth_service;
pub mod transport;

pub use api_client::{ApiClient, RequestConfig};
pub use api_error::{normalize_error, ApiError, ErrorEnvelope, RawFailure};
pub use auth_service::AuthError;
pub use transport::{
    FetchTransport, HttpMethod, PreparedRequest, RawResponse, RequestBody, ResponseBody,
    ResponseType, Transport, TransportFailure,
};
