//! # Gazette
//!
//! Article management backend with session-based authentication.
//!
//! Authenticated users manage a list of articles (title/author records)
//! over HTTP, with a cookie-based theme preference and email/password
//! login. The authentication core (credential verification, session
//! identity lifecycle, and the access gate in front of protected routes)
//! lives in [`api::handlers::auth`]; article and account persistence sit
//! behind injectable store traits.
//!
//! ## Sessions
//!
//! A random session id travels in an `HttpOnly` cookie and keys
//! server-side state of shape `{ token, flash }`. The token is the
//! verified account's email, re-looked-up on every request; a deleted
//! account degrades the session to anonymous. The flash slot carries a
//! one-shot message consumed by exactly the next rendered page.
//!
//! Unauthenticated access to protected routes always redirects to
//! `/login` with a message, never a bare 401/403.

pub mod api;
pub mod cli;
