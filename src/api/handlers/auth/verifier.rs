//! Credential verification against the identity store.

use anyhow::Result;

use super::storage::{Identity, IdentityStore};

/// Outcome of a credential check. Infrastructure failures travel in the
/// `Err` arm and are a different failure class from a mismatch.
#[derive(Debug)]
pub(crate) enum VerifyOutcome {
    Verified(Identity),
    InvalidCredentials,
}

/// Check a presented email/password pair.
///
/// Uses the store's combined exact-match lookup, so the result never
/// distinguishes an unknown email from a wrong password.
pub(crate) async fn verify(
    store: &dyn IdentityStore,
    email: &str,
    password: &str,
) -> Result<VerifyOutcome> {
    if email.is_empty() || password.is_empty() {
        return Ok(VerifyOutcome::InvalidCredentials);
    }
    match store.find_by_credentials(email, password).await? {
        Some(identity) => Ok(VerifyOutcome::Verified(identity)),
        None => Ok(VerifyOutcome::InvalidCredentials),
    }
}
