//! Server-side session state and the session-id cookie.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::state::AppConfig;

pub(crate) const SESSION_COOKIE_NAME: &str = "gazette_session";

/// Per-client session state, shape `{ token, flash }`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Email of a previously verified account, or `None` when anonymous.
    /// The token is re-looked-up, never re-verified, on later requests.
    pub token: Option<String>,
    /// One-shot message consumed by exactly the next rendered page.
    pub flash: Option<String>,
}

/// Session persistence keyed by the cookie-carried session id.
///
/// Implementations must provide atomic read/write per key. `take_flash`
/// is a read-and-clear and is not reentrant: two concurrent reads of the
/// same session may both observe (and both clear) the message.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;
    async fn save(&self, session_id: &str, state: SessionState) -> Result<()>;
    async fn delete(&self, session_id: &str) -> Result<()>;
    async fn take_flash(&self, session_id: &str) -> Result<Option<String>>;
}

/// In-memory session store. The trait boundary admits a distributed
/// store for multi-instance deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, state: SessionState) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session_id.to_string(), state);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn take_flash(&self, session_id: &str) -> Result<Option<String>> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions
            .get_mut(session_id)
            .and_then(|state| state.flash.take()))
    }
}

/// Store the identity token on the session, creating the entry if needed.
pub(crate) async fn set_token(
    store: &dyn SessionStore,
    session_id: &str,
    token: String,
) -> Result<()> {
    let mut state = store.load(session_id).await?.unwrap_or_default();
    state.token = Some(token);
    store.save(session_id, state).await
}

/// Drop the identity token, leaving the rest of the session intact.
pub(crate) async fn clear_token(store: &dyn SessionStore, session_id: &str) -> Result<()> {
    let mut state = store.load(session_id).await?.unwrap_or_default();
    state.token = None;
    store.save(session_id, state).await
}

/// Attach a one-shot message for the next rendered page.
pub(crate) async fn set_flash(
    store: &dyn SessionStore,
    session_id: &str,
    message: &str,
) -> Result<()> {
    let mut state = store.load(session_id).await?.unwrap_or_default();
    state.flash = Some(message.to_string());
    store.save(session_id, state).await
}

/// Create a new session id for the cookie.
pub(crate) fn generate_session_id() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session id")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Reuse the session id from the request cookie or mint a new one.
/// The boolean is true when the id is new and a cookie must be set.
pub(crate) fn ensure_session_id(headers: &HeaderMap) -> Result<(String, bool)> {
    if let Some(session_id) = extract_session_id(headers) {
        return Ok((session_id, false));
    }
    Ok((generate_session_id()?, true))
}

pub(crate) fn extract_session_id(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE_NAME)
}

pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        // Pairs without an '=' are skipped, not fatal for the header.
        let Some(val) = parts.next() else {
            continue;
        };
        if key == name {
            return Some(val.trim().to_string());
        }
    }
    None
}

/// Build the `HttpOnly` cookie carrying the session id.
pub(crate) fn session_cookie(
    config: &AppConfig,
    session_id: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    // Only mark cookies secure when the site is served over HTTPS.
    let secure = config.session_cookie_secure();
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn flash_is_read_exactly_once() -> Result<()> {
        let store = MemorySessionStore::new();
        set_flash(&store, "sid", "You must login to view the articles").await?;

        let first = store.take_flash("sid").await?;
        assert_eq!(
            first.as_deref(),
            Some("You must login to view the articles")
        );

        let second = store.take_flash("sid").await?;
        assert_eq!(second, None);
        Ok(())
    }

    #[tokio::test]
    async fn take_flash_preserves_token() -> Result<()> {
        let store = MemorySessionStore::new();
        set_token(&store, "sid", "a@x.com".to_string()).await?;
        set_flash(&store, "sid", "notice").await?;

        store.take_flash("sid").await?;

        let state = store.load("sid").await?.unwrap_or_default();
        assert_eq!(state.token.as_deref(), Some("a@x.com"));
        assert_eq!(state.flash, None);
        Ok(())
    }

    #[tokio::test]
    async fn clear_token_keeps_session_entry() -> Result<()> {
        let store = MemorySessionStore::new();
        set_token(&store, "sid", "a@x.com".to_string()).await?;
        clear_token(&store, "sid").await?;

        let state = store.load("sid").await?;
        assert_eq!(state, Some(SessionState::default()));
        Ok(())
    }

    #[tokio::test]
    async fn delete_discards_the_whole_session() -> Result<()> {
        let store = MemorySessionStore::new();
        set_token(&store, "sid", "a@x.com".to_string()).await?;

        store.delete("sid").await?;
        assert_eq!(store.load("sid").await?, None);
        Ok(())
    }

    #[test]
    fn generated_session_ids_are_unique_and_decodable() {
        let first = generate_session_id().ok();
        let second = generate_session_id().ok();
        assert!(first.is_some());
        assert_ne!(first, second);

        let decoded_len = first
            .and_then(|id| Base64UrlUnpadded::decode_vec(&id).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn cookie_value_parses_multiple_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; gazette_session=abc123; other=1"),
        );
        assert_eq!(extract_session_id(&headers), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_skips_pairs_without_a_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("bare; gazette_session=abc123"),
        );
        assert_eq!(extract_session_id(&headers), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "bare"), None);
    }

    #[test]
    fn session_cookie_secure_follows_base_url_scheme() {
        let config = AppConfig::new("https://gazette.dev".to_string());
        let cookie = session_cookie(&config, "abc").ok();
        let value = cookie.as_ref().and_then(|v| v.to_str().ok());
        assert!(value.is_some_and(|v| v.contains("Secure")));

        let config = AppConfig::new("http://localhost:4000".to_string());
        let cookie = session_cookie(&config, "abc").ok();
        let value = cookie.as_ref().and_then(|v| v.to_str().ok());
        assert!(value.is_some_and(|v| !v.contains("Secure") && v.contains("HttpOnly")));
    }
}
