// ============================================================================
// INVIGILO WEB SESSION - session store + authenticated API client (WASM)
// ============================================================================
// - config:   build-time settings
// - models:   user profile, login payload, token claims
// - state:    UserSession (token, profile, viewing company)
// - services: ApiClient, error normalization, auth calls
// - utils:    storage backends, query string serialization
// - app:      composition root
// ============================================================================

pub mod app;
pub mod config;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use app::App;
pub use config::{AppConfig, CONFIG};
pub use models::{TokenClaims, UserAccess, UserData};
pub use services::{ApiClient, ApiError, ErrorEnvelope, RequestConfig};
pub use state::{SessionError, SessionHandle, UserSession};
pub use utils::QueryParams;

/// Panic hook + console logger
pub fn init(config: &AppConfig) {
    console_error_panic_hook::set_once();
    if config.is_logging_enabled() {
        let level = if config.is_production() {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        wasm_logger::init(wasm_logger::Config::new(level));
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_entry {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;

    use crate::{App, CONFIG};

    thread_local! {
        static APP: RefCell<Option<Rc<App>>> = RefCell::new(None);
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        crate::init(&CONFIG);

        let app = Rc::new(App::new(CONFIG.clone()));
        APP.with(|cell| *cell.borrow_mut() = Some(app.clone()));

        wasm_bindgen_futures::spawn_local(async move {
            match app.start().await {
                Ok(logged_in) => log::info!("✅ Session restored (logged in: {})", logged_in),
                Err(e) => log::error!("❌ Could not restore session: {}", e),
            }
        });
        Ok(())
    }

    /// `true` when the current session may act with `permission`
    #[wasm_bindgen(js_name = hasPermission)]
    pub fn has_permission(permission: &str) -> bool {
        APP.with(|cell| {
            cell.borrow()
                .as_ref()
                .is_some_and(|app| app.session().borrow().has_permission(permission))
        })
    }

    #[wasm_bindgen(js_name = isLoggedIn)]
    pub fn is_logged_in() -> bool {
        APP.with(|cell| {
            cell.borrow()
                .as_ref()
                .is_some_and(|app| app.session().borrow().is_logged_in())
        })
    }
}
