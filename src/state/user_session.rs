// ============================================================================
// USER SESSION - token, profile and viewing company
// ============================================================================
// Plain struct: loaded once from storage at startup, every mutation of a
// persisted field writes through to storage right away. Derived values
// (logged in, superuser, effective viewing company) are computed on read.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::models::{decode_token, TokenClaims, TokenError, UserAccess, UserData};
use crate::utils::storage::{load_json, save_json};
use crate::utils::{SessionStorage, StorageError, TOKEN_STORAGE_KEY, VIEWING_COMPANY_STORAGE_KEY};

/// Shared handle; the app runs on a single event loop
pub type SessionHandle = Rc<RefCell<UserSession>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidToken(#[from] TokenError),
    #[error("session storage: {0}")]
    Storage(#[from] StorageError),
}

pub struct UserSession {
    storage: Rc<dyn SessionStorage>,
    token: Option<String>,
    user: Option<UserData>,
    viewing_company_id: Option<i64>,
    loading: bool,
}

impl UserSession {
    /// Restores the persisted fields from `storage`
    pub fn load(storage: Rc<dyn SessionStorage>) -> Self {
        let token = match storage.get_item(TOKEN_STORAGE_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("⚠️ Could not read stored token: {}", e);
                None
            }
        };
        let viewing_company_id =
            load_json::<Option<i64>>(storage.as_ref(), VIEWING_COMPANY_STORAGE_KEY).flatten();

        log::debug!(
            "🔑 Session restored (token: {}, viewing company: {:?})",
            token.is_some(),
            viewing_company_id
        );

        Self {
            storage,
            token,
            user: None,
            viewing_company_id,
            loading: true,
        }
    }

    pub fn into_handle(self) -> SessionHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserData> {
        self.user.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_superuser(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_superuser)
    }

    /// Effective viewing company: only superusers get one, and `0` counts
    /// as unset.
    pub fn viewing_company_id(&self) -> Option<i64> {
        if !self.is_superuser() {
            return None;
        }
        self.viewing_company_id.filter(|id| *id != 0)
    }

    /// Value as persisted, whatever the current user is
    pub fn stored_viewing_company_id(&self) -> Option<i64> {
        self.viewing_company_id
    }

    /// Always persists, even for non-superusers.
    pub fn set_viewing_company_id(&mut self, company_id: Option<i64>) -> Result<(), SessionError> {
        self.viewing_company_id = company_id;
        save_json(self.storage.as_ref(), VIEWING_COMPANY_STORAGE_KEY, &company_id)?;
        Ok(())
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.has_permission(name))
    }

    /// Claims of the current token, if there is one
    pub fn claims(&self) -> Result<Option<TokenClaims>, SessionError> {
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(Some(decode_token(token)?)),
            _ => Ok(None),
        }
    }

    pub fn set_token(&mut self, token: Option<String>) -> Result<(), SessionError> {
        self.token = token;
        // empty string is the "no token" marker on disk
        let stored = self.token.as_deref().unwrap_or("");
        self.storage.set_item(TOKEN_STORAGE_KEY, stored)?;
        Ok(())
    }

    /// Stores `user`, replacing its permissions with the token's scopes
    /// when a token is set and carries them.
    ///
    /// Fails only if the current token cannot be decoded; the user is left
    /// untouched in that case.
    pub fn set_user(&mut self, user: Option<UserData>) -> Result<(), SessionError> {
        let mut user = user;
        if let Some(claims) = self.claims()? {
            if let (Some(user), Some(scopes)) = (user.as_mut(), claims.scopes) {
                user.permissions = Some(scopes);
            }
        }
        self.user = user;
        Ok(())
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// `None` clears token and user.
    pub fn login_user(&mut self, access: Option<UserAccess>) -> Result<(), SessionError> {
        let (token, user) = match access {
            Some(access) => (Some(access.access_token), access.user),
            None => (None, None),
        };
        self.set_token(token)?;
        self.set_user(user)?;
        log::info!("🔐 Session logged in: {}", self.is_logged_in());
        Ok(())
    }

    /// Clears token and user. The stored viewing company is kept.
    pub fn logout_user(&mut self) -> Result<(), SessionError> {
        self.user = None;
        self.set_token(None)?;
        log::info!("👋 Session logged out");
        Ok(())
    }
}
