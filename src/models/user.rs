use serde::{Deserialize, Serialize};

/// Scope names the backend grants through the token
pub mod scopes {
    pub const ADMIN: &str = "admin";
    pub const INSPECTOR: &str = "inspector";
    pub const BRIDGE: &str = "bridge";
    pub const UPDATE_STREAM: &str = "update-stream";
}

/// User profile as returned by `/login/access-token` and `/users/me`.
///
/// Every field is optional on the wire; the session may hold a partial
/// profile while a refresh is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserData {
    pub id: Option<i64>,
    pub is_superuser: bool,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub company_id: Option<i64>,
    pub permissions: Option<Vec<String>>,
}

impl UserData {
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.iter().any(|p| p == name))
    }
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccess {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<UserData>,
}
