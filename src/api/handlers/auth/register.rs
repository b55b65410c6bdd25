//! Account registration endpoints.
//!
//! Registration never auto-authenticates: a created account is sent to
//! the login page to establish a session the normal way.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::error;

use super::{gate, state::AuthState, storage::CreateOutcome, types::CredentialsForm};

pub(crate) const MISSING_FIELDS_MESSAGE: &str = "Email and password are required";
pub(crate) const DUPLICATE_ACCOUNT_MESSAGE: &str = "Account already exists";

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration form")
    ),
    tag = "auth"
)]
pub(crate) async fn register_form() -> Html<&'static str> {
    Html(concat!(
        "<h1>Register</h1>",
        "<form method=\"post\" action=\"/register\">",
        "<input name=\"email\" type=\"email\" placeholder=\"Email\">",
        "<input name=\"password\" type=\"password\" placeholder=\"Password\">",
        "<button type=\"submit\">Register</button>",
        "</form>"
    ))
}

#[utoipa::path(
    post,
    path = "/register",
    responses(
        (status = 303, description = "Account created, redirect to /login"),
        (status = 400, description = "Email or password missing", content_type = "text/plain"),
        (status = 409, description = "Account already exists", content_type = "text/plain")
    ),
    tag = "auth"
)]
pub(crate) async fn register(
    state: Extension<Arc<AuthState>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let password = form.password.expose_secret();
    if form.email.is_empty() || password.is_empty() {
        return (StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE).into_response();
    }

    match state.identity().find_by_email(&form.email).await {
        Ok(Some(_)) => {
            return (StatusCode::CONFLICT, DUPLICATE_ACCOUNT_MESSAGE).into_response();
        }
        Ok(None) => {}
        Err(err) => {
            error!("Failed to check for existing account: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    match state.identity().create(&form.email, password).await {
        Ok(CreateOutcome::Created) => Redirect::to(gate::LOGIN_REDIRECT).into_response(),
        // Lost a race with a concurrent registration; same answer as the pre-check.
        Ok(CreateOutcome::Conflict) => {
            (StatusCode::CONFLICT, DUPLICATE_ACCOUNT_MESSAGE).into_response()
        }
        Err(err) => {
            error!("Failed to create account: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
