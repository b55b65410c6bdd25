//! Access gate consulted by every protected route.

use anyhow::Result;
use axum::{
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

use super::{codec, session, state::AuthState, storage::Identity};

pub(crate) const LOGIN_REDIRECT: &str = "/login";
pub(crate) const LOGIN_REQUIRED_MESSAGE: &str = "You must login to view the articles";

/// Gate decision: a pure function of whether the request carries a
/// currently-valid reconstructed identity.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Gate {
    Allow,
    Deny {
        redirect: &'static str,
        message: &'static str,
    },
}

#[must_use]
pub(crate) fn authorize(identity: Option<&Identity>) -> Gate {
    if identity.is_some() {
        Gate::Allow
    } else {
        Gate::Deny {
            redirect: LOGIN_REDIRECT,
            message: LOGIN_REQUIRED_MESSAGE,
        }
    }
}

/// Reconstruct the identity attached to the request's session, if any.
///
/// A token whose account has been deleted degrades to `Ok(None)`; only
/// store failures surface as errors.
pub(crate) async fn current_identity(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<Option<Identity>> {
    let Some(session_id) = session::extract_session_id(headers) else {
        return Ok(None);
    };
    let Some(session_state) = state.sessions().load(&session_id).await? else {
        return Ok(None);
    };
    let Some(token) = session_state.token else {
        return Ok(None);
    };
    codec::decode(state.identity(), &token).await
}

/// Resolve the request to a verified identity or a ready-made response.
///
/// Anonymous requests get a flash message on their session and a redirect
/// to the login page, never a bare 401/403. Store failures answer 500.
pub(crate) async fn require_identity(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<Identity, Response> {
    let identity = match current_identity(headers, state).await {
        Ok(identity) => identity,
        Err(err) => {
            error!("Failed to reconstruct session identity: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
        }
    };

    match authorize(identity.as_ref()) {
        Gate::Allow => {
            identity.ok_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Gate::Deny { redirect, message } => {
            Err(deny_response(headers, state, redirect, message).await)
        }
    }
}

async fn deny_response(
    headers: &HeaderMap,
    state: &AuthState,
    redirect: &'static str,
    message: &'static str,
) -> Response {
    let (session_id, is_new) = match session::ensure_session_id(headers) {
        Ok(pair) => pair,
        Err(err) => {
            error!("Failed to create session id: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Err(err) = session::set_flash(state.sessions(), &session_id, message).await {
        error!("Failed to store flash message: {err}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let mut response_headers = HeaderMap::new();
    if is_new {
        if let Ok(cookie) = session::session_cookie(state.config(), &session_id) {
            response_headers.insert(SET_COOKIE, cookie);
        }
    }
    (response_headers, Redirect::to(redirect)).into_response()
}
