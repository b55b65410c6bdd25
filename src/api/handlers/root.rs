//! Public index page.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use super::auth::{gate, AuthState};
use super::theme;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Index with theme and, when signed in, the account email")
    ),
    tag = "root"
)]
pub(crate) async fn index(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    // Public page, but it still reconstructs the identity to greet the user.
    let identity = match gate::current_identity(&headers, &state).await {
        Ok(identity) => identity,
        Err(err) => {
            error!("Failed to reconstruct session identity: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let theme = theme::current_theme(&headers);
    let greeting = identity
        .map(|identity| format!("<p>Signed in as {}</p>", identity.email))
        .unwrap_or_else(|| "<p><a href=\"/login\">Login</a></p>".to_string());

    Html(format!(
        "<body data-theme=\"{theme}\"><h1>Gazette</h1>{greeting}</body>"
    ))
    .into_response()
}
