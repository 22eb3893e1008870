use std::sync::Arc;

use anyhow::{Context, Result};
use storage::Storage;

pub mod auth;
pub mod backend;
pub mod category_screen;
pub mod config;
pub mod dialog;
pub mod list_controller;
pub mod session;

pub use auth::{AuthFlow, LoginError, PasswordVerifier, RegisterError, RegistrationSubmit};
pub use backend::{BackendError, CategoryBackend, HttpBackend, UserDirectory};
pub use category_screen::{CategoryScreen, ScreenError};
pub use config::Settings;
pub use dialog::{DialogKind, DialogState};
pub use list_controller::{FetchError, ListController, MutationError};
pub use session::{
    MemorySessionStore, Route, RouteDecision, RouteGuard, SessionStore, StorageSessionStore,
};

/// Everything a front-end needs, built from one [`Settings`].
pub struct ClientContext {
    pub settings: Settings,
    pub backend: Arc<HttpBackend>,
    pub sessions: Arc<dyn SessionStore>,
    pub auth: Arc<AuthFlow>,
    pub guard: RouteGuard,
}

impl ClientContext {
    pub async fn from_settings(settings: Settings) -> Result<Self> {
        let backend = Arc::new(
            HttpBackend::new(&settings.backend_url, settings.request_timeout())
                .context("failed to build backend client")?,
        );
        let storage = Storage::new(&settings.session_db_url)
            .await
            .context("failed to open session store")?;
        let sessions: Arc<dyn SessionStore> = Arc::new(StorageSessionStore::new(storage));
        let auth = Arc::new(AuthFlow::new(
            backend.clone(),
            sessions.clone(),
            Arc::new(auth::Sha256PasswordVerifier),
        ));
        let guard = RouteGuard::new(sessions.clone());

        Ok(Self {
            settings,
            backend,
            sessions,
            auth,
            guard,
        })
    }

    pub fn category_screen(&self) -> CategoryScreen {
        CategoryScreen::new(ListController::new(
            self.backend.clone(),
            self.settings.request_timeout(),
        ))
    }

    pub fn registration_wizard(&self) -> Result<wizard::WizardController> {
        wizard::WizardController::new(
            wizard::steps::registration_steps(),
            Arc::new(RegistrationSubmit::new(self.auth.clone())),
        )
        .context("failed to build registration wizard")
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
