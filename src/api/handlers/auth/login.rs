//! Login and logout endpoints.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::error;

use super::{
    codec, gate, session,
    state::AuthState,
    types::CredentialsForm,
    verifier::{self, VerifyOutcome},
};

pub(crate) const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form with any pending one-shot message")
    ),
    tag = "auth"
)]
pub(crate) async fn login_form(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
) -> Response {
    // Consume the flash here so the next render no longer sees it.
    let message = match session::extract_session_id(&headers) {
        Some(session_id) => match state.sessions().take_flash(&session_id).await {
            Ok(message) => message,
            Err(err) => {
                error!("Failed to read flash message: {err}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        None => None,
    };

    render_login(message.as_deref()).into_response()
}

#[utoipa::path(
    post,
    path = "/login",
    responses(
        (status = 303, description = "Redirect to / on success, /login with a message on mismatch"),
        (status = 500, description = "Identity or session store failure")
    ),
    tag = "auth"
)]
pub(crate) async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    // Verification strictly precedes any session mutation.
    let outcome = match verifier::verify(
        state.identity(),
        &form.email,
        form.password.expose_secret(),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Credential verification failed: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let (session_id, is_new) = match session::ensure_session_id(&headers) {
        Ok(pair) => pair,
        Err(err) => {
            error!("Failed to create session id: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let (target, update) = match outcome {
        VerifyOutcome::Verified(identity) => (
            "/",
            session::set_token(state.sessions(), &session_id, codec::encode(&identity)).await,
        ),
        VerifyOutcome::InvalidCredentials => (
            gate::LOGIN_REDIRECT,
            session::set_flash(state.sessions(), &session_id, INVALID_CREDENTIALS_MESSAGE).await,
        ),
    };

    if let Err(err) = update {
        error!("Failed to update session: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    redirect_with_session(&state, target, &session_id, is_new)
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session token cleared, redirect to /")
    ),
    tag = "auth"
)]
pub(crate) async fn logout(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    // Logout is idempotent; an anonymous session just redirects home.
    if let Some(session_id) = session::extract_session_id(&headers) {
        if let Err(err) = session::clear_token(state.sessions(), &session_id).await {
            error!("Failed to clear session token: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    Redirect::to("/").into_response()
}

fn redirect_with_session(
    state: &AuthState,
    target: &str,
    session_id: &str,
    is_new: bool,
) -> Response {
    let mut response_headers = HeaderMap::new();
    if is_new {
        if let Ok(cookie) = session::session_cookie(state.config(), session_id) {
            response_headers.insert(SET_COOKIE, cookie);
        }
    }
    (response_headers, Redirect::to(target)).into_response()
}

fn render_login(message: Option<&str>) -> Html<String> {
    let notice = message
        .map(|message| format!("<p class=\"notice\">{message}</p>"))
        .unwrap_or_default();
    Html(format!(
        concat!(
            "<h1>Login</h1>{}",
            "<form method=\"post\" action=\"/login\">",
            "<input name=\"email\" type=\"email\" placeholder=\"Email\">",
            "<input name=\"password\" type=\"password\" placeholder=\"Password\">",
            "<button type=\"submit\">Login</button>",
            "</form>"
        ),
        notice
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_login_includes_message_when_present() {
        let Html(body) = render_login(Some(INVALID_CREDENTIALS_MESSAGE));
        assert!(body.contains(INVALID_CREDENTIALS_MESSAGE));

        let Html(body) = render_login(None);
        assert!(!body.contains("notice"));
        assert!(body.contains("action=\"/login\""));
    }
}
