//! Identity store: account lookup and creation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::Instrument;

/// A verified or reconstructed account identity. Never carries the password.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created,
    Conflict,
}

/// Account persistence consumed by the authentication core.
///
/// `find_by_credentials` is a single combined exact-match lookup; callers
/// never learn which half of the pair failed to match.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;
    async fn find_by_credentials(&self, email: &str, password: &str)
        -> Result<Option<Identity>>;
    async fn create(&self, email: &str, password: &str) -> Result<CreateOutcome>;
}

/// Postgres-backed identity store.
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let query = "SELECT email FROM users WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by email")?;

        Ok(row.map(|row| Identity {
            email: row.get("email"),
        }))
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>> {
        // One exact-match query; a miss never reveals which half was wrong.
        let query = "SELECT email FROM users WHERE email = $1 AND password = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by credentials")?;

        Ok(row.map(|row| Identity {
            email: row.get("email"),
        }))
    }

    async fn create(&self, email: &str, password: &str) -> Result<CreateOutcome> {
        let query = "INSERT INTO users (email, password) VALUES ($1, $2)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(email)
            .bind(password)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert account"),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// In-memory identity store for tests and local runs.
#[derive(Default)]
pub struct MemoryIdentityStore {
    accounts: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(email).map(|_| Identity {
            email: email.to_string(),
        }))
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>> {
        let accounts = self.accounts.lock().await;
        Ok(accounts
            .get(email)
            .filter(|stored| stored.as_str() == password)
            .map(|_| Identity {
                email: email.to_string(),
            }))
    }

    async fn create(&self, email: &str, password: &str) -> Result<CreateOutcome> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Ok(CreateOutcome::Conflict);
        }
        accounts.insert(email.to_string(), password.to_string());
        Ok(CreateOutcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[tokio::test]
    async fn memory_store_round_trips_account() -> Result<()> {
        let store = MemoryIdentityStore::new();
        assert!(matches!(
            store.create("a@x.com", "p1").await?,
            CreateOutcome::Created
        ));

        let identity = store.find_by_email("a@x.com").await?;
        assert_eq!(identity.map(|identity| identity.email), Some("a@x.com".to_string()));

        let verified = store.find_by_credentials("a@x.com", "p1").await?;
        assert!(verified.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_rejects_wrong_password_and_unknown_email() -> Result<()> {
        let store = MemoryIdentityStore::new();
        store.create("a@x.com", "p1").await?;

        assert!(store.find_by_credentials("a@x.com", "wrong").await?.is_none());
        assert!(store.find_by_credentials("b@x.com", "p1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_duplicate_create_conflicts() -> Result<()> {
        let store = MemoryIdentityStore::new();
        store.create("a@x.com", "p1").await?;
        assert!(matches!(
            store.create("a@x.com", "p2").await?,
            CreateOutcome::Conflict
        ));

        // The original password still wins; the duplicate never replaced it.
        assert!(store.find_by_credentials("a@x.com", "p1").await?.is_some());
        assert!(store.find_by_credentials("a@x.com", "p2").await?.is_none());
        Ok(())
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
