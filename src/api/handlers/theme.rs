//! Theme preference cookie.

use axum::{
    extract::{Extension, Path},
    http::{
        header::{InvalidHeaderValue, REFERER, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::auth::{session, AppConfig, AuthState};

pub(crate) const THEME_COOKIE_NAME: &str = "theme";
const ALLOWED_THEMES: [&str; 2] = ["light", "dark"];
pub(crate) const DEFAULT_THEME: &str = "light";

#[utoipa::path(
    get,
    path = "/set-theme/{theme}",
    responses(
        (status = 303, description = "Theme cookie set for known themes, redirect back")
    ),
    tag = "theme"
)]
pub(crate) async fn set_theme(
    Path(theme): Path<String>,
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
) -> Response {
    let mut response_headers = HeaderMap::new();
    // Unknown themes change nothing; the redirect still happens.
    if ALLOWED_THEMES.contains(&theme.as_str()) {
        if let Ok(cookie) = theme_cookie(state.config(), &theme) {
            response_headers.insert(SET_COOKIE, cookie);
        }
    }

    let target = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("/");
    (response_headers, Redirect::to(target)).into_response()
}

/// Current theme from the request cookie, defaulting to light.
pub(crate) fn current_theme(headers: &HeaderMap) -> String {
    session::cookie_value(headers, THEME_COOKIE_NAME)
        .filter(|theme| ALLOWED_THEMES.contains(&theme.as_str()))
        .unwrap_or_else(|| DEFAULT_THEME.to_string())
}

// Readable by page scripts, so deliberately not HttpOnly.
fn theme_cookie(config: &AppConfig, theme: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.theme_cookie_max_age_seconds();
    HeaderValue::from_str(&format!(
        "{THEME_COOKIE_NAME}={theme}; Path=/; Max-Age={max_age}"
    ))
}
