/// localStorage key holding the raw bearer token (`""` when logged out)
pub const TOKEN_STORAGE_KEY: &str = "token";

/// localStorage key holding the JSON-encoded viewing company (`5` or `null`)
pub const VIEWING_COMPANY_STORAGE_KEY: &str = "as_company";

/// Status the backend uses for request validation failures
pub const VALIDATION_ERROR_STATUS: u16 = 422;

/// Message used when a validation entry carries no `msg`
pub const DEFAULT_FIELD_ERROR: &str = "error";

/// Message surfaced when the request never reached the server
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error";
