//! Application configuration and shared auth state.

use std::sync::Arc;

use super::session::SessionStore;
use super::storage::IdentityStore;

const DEFAULT_THEME_COOKIE_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    base_url: String,
    theme_cookie_max_age_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            theme_cookie_max_age_seconds: DEFAULT_THEME_COOKIE_MAX_AGE_SECONDS,
        }
    }

    #[must_use]
    pub fn with_theme_cookie_max_age_seconds(mut self, seconds: i64) -> Self {
        self.theme_cookie_max_age_seconds = seconds;
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn theme_cookie_max_age_seconds(&self) -> i64 {
        self.theme_cookie_max_age_seconds
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Shared state for the authentication core: configuration plus the
/// injected identity and session stores. Handlers receive it as an
/// `Extension<Arc<AuthState>>`; nothing in the core reaches for globals.
pub struct AuthState {
    config: AppConfig,
    identity: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthState {
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            identity,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn identity(&self) -> &dyn IdentityStore {
        self.identity.as_ref()
    }

    pub(crate) fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }
}
