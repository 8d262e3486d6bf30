use thiserror::Error;

use crate::models::{UserAccess, UserData};
use crate::services::api_client::{ApiClient, RequestConfig};
use crate::services::api_error::ApiError;
use crate::services::transport::{HttpMethod, Transport};
use crate::state::SessionError;
use crate::utils::QueryParams;

const LOGIN_PATH: &str = "login/access-token";
const CURRENT_USER_PATH: &str = "users/me";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Exchange email + password for a token and start the session
pub async fn login<T: Transport>(
    api: &ApiClient<T>,
    email: &str,
    password: &str,
) -> Result<UserAccess, AuthError> {
    log::info!("🔐 Logging in as {}", email);
    api.session().borrow_mut().set_loading(true);

    let config = RequestConfig::new(HttpMethod::Post, LOGIN_PATH).form(vec![
        ("username".to_string(), email.to_string()),
        ("password".to_string(), password.to_string()),
    ]);
    let result = api.request_json::<UserAccess>(config).await;

    let mut session = api.session().borrow_mut();
    session.set_loading(false);
    let access = result?;
    session.login_user(Some(access.clone()))?;
    Ok(access)
}

/// Reload the profile; token scopes still decide the permissions
pub async fn refresh_current_user<T: Transport>(api: &ApiClient<T>) -> Result<UserData, AuthError> {
    let user: UserData = api.get(CURRENT_USER_PATH, QueryParams::new()).await?;
    api.session().borrow_mut().set_user(Some(user))?;

    let session = api.session().borrow();
    Ok(session.user().cloned().unwrap_or_default())
}

/// Restore a persisted session at startup. A rejected token logs the
/// session out; transport failures leave it as is.
pub async fn restore_session<T: Transport>(api: &ApiClient<T>) -> Result<bool, AuthError> {
    if !api.session().borrow().is_logged_in() {
        api.session().borrow_mut().set_loading(false);
        return Ok(false);
    }

    let result = refresh_current_user(api).await;
    let mut session = api.session().borrow_mut();
    session.set_loading(false);
    match result {
        Ok(_) => Ok(true),
        Err(AuthError::Api(e)) if e.is_unauthorized() => {
            log::warn!("🔒 Stored token rejected, logging out");
            session.logout_user()?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

pub fn logout<T: Transport>(api: &ApiClient<T>) -> Result<(), AuthError> {
    api.session().borrow_mut().logout_user()?;
    Ok(())
}
