// ============================================================================
// TOKEN - JWT payload decoding (no signature check, the server does that)
// ============================================================================

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token: missing payload segment")]
    MissingPayload,
    #[error("invalid token: payload is not base64 ({0})")]
    Base64(String),
    #[error("invalid token: payload is not JSON ({0})")]
    Json(String),
}

/// Claims carried by the access token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<Value>,
    #[serde(default)]
    pub exp: Option<i64>,
    /// Granted permissions; authoritative over the profile's own list
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<String> {
        match self.sub.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp?, 0)
    }

    /// Tokens without `exp` never expire
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Decodes the payload (second segment) of a JWT.
pub fn decode_token(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::MissingPayload)?;
    let payload = payload.trim_end_matches('=');

    // some issuers emit the standard alphabet
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|e| TokenError::Base64(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::Engine as _;
    use serde_json::json;

    /// Unsigned test token around `payload`
    pub(crate) fn make_token(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn decodes_scopes_and_subject() {
        let token = make_token(&json!({ "sub": "12", "exp": 1_700_000_000, "scopes": ["read", "write"] }));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.scopes, Some(vec!["read".to_string(), "write".to_string()]));
        assert_eq!(claims.subject().as_deref(), Some("12"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn numeric_subject_and_extra_claims() {
        let token = make_token(&json!({ "sub": 7, "company": 3 }));
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.subject().as_deref(), Some("7"));
        assert_eq!(claims.scopes, None);
        assert_eq!(claims.extra.get("company"), Some(&json!(3)));
    }

    #[test]
    fn padded_payload_is_accepted() {
        let body = STANDARD_NO_PAD.encode(br#"{"scopes":[]}"#);
        let token = format!("h.{}==.s", body);
        assert_eq!(decode_token(&token).unwrap().scopes, Some(vec![]));
    }

    #[test]
    fn expiry_check() {
        let token = make_token(&json!({ "exp": 100 }));
        let claims = decode_token(&token).unwrap();
        let later = DateTime::from_timestamp(200, 0).unwrap();
        let earlier = DateTime::from_timestamp(50, 0).unwrap();
        assert!(claims.is_expired_at(later));
        assert!(!claims.is_expired_at(earlier));
        assert!(!TokenClaims::default().is_expired_at(later));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(decode_token("no-dots"), Err(TokenError::MissingPayload));
        assert_eq!(decode_token("a..c"), Err(TokenError::MissingPayload));
        assert!(matches!(decode_token("a.!!!.c"), Err(TokenError::Base64(_))));
        let not_json = URL_SAFE_NO_PAD.encode("hello");
        assert!(matches!(decode_token(&format!("a.{}.c", not_json)), Err(TokenError::Json(_))));
    }
}
