// ============================================================================
// APP - composition root
// ============================================================================
// Owns the session and the API client. Everything that needs to talk to the
// backend gets the client from here instead of a global.
// ============================================================================

use std::rc::Rc;

use crate::config::AppConfig;
use crate::services::auth_service::{self, AuthError};
use crate::services::{ApiClient, FetchTransport, Transport};
use crate::state::{SessionHandle, UserSession};
use crate::utils::{BrowserStorage, SessionStorage};

pub struct App<T: Transport = FetchTransport> {
    config: AppConfig,
    api: ApiClient<T>,
}

impl App<FetchTransport> {
    /// Browser wiring: localStorage + fetch
    pub fn new(config: AppConfig) -> Self {
        Self::from_parts(config, Rc::new(BrowserStorage), FetchTransport)
    }
}

impl<T: Transport> App<T> {
    pub fn from_parts(config: AppConfig, storage: Rc<dyn SessionStorage>, transport: T) -> Self {
        let session = UserSession::load(storage).into_handle();
        let api = ApiClient::with_transport(&config.api_base_url, transport, session);
        log::info!("🚀 App ready ({}, {})", config.environment, api.base_url());
        Self { config, api }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn session(&self) -> &SessionHandle {
        self.api.session()
    }

    /// Validates a stored token against the backend
    pub async fn start(&self) -> Result<bool, AuthError> {
        auth_service::restore_session(&self.api).await
    }
}
