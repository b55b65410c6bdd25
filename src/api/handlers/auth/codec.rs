//! Session identity codec: identity to durable token and back.

use anyhow::Result;

use super::storage::{Identity, IdentityStore};

/// Reduce a verified identity to the minimal datum stored in the session.
/// No secret material ever enters the token.
pub(crate) fn encode(identity: &Identity) -> String {
    identity.email.clone()
}

/// Reconstruct a full identity from a session token.
///
/// Returns `Ok(None)` when the account no longer exists; callers must
/// treat that as "session is now anonymous", not as an error.
pub(crate) async fn decode(store: &dyn IdentityStore, token: &str) -> Result<Option<Identity>> {
    store.find_by_email(token).await
}
