//! Article records and persistence.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub author: String,
}

/// Article persistence behind the access gate.
///
/// Syntactically invalid identifiers are treated as "not found" across
/// the board: `find` yields `Ok(None)`, `update` yields `Ok(false)`,
/// `delete` is a no-op. They are never errors.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Article>>;
    async fn find(&self, id: &str) -> Result<Option<Article>>;
    async fn create(&self, title: &str, author: &str) -> Result<Article>;
    async fn update(&self, id: &str, title: &str, author: &str) -> Result<bool>;
    async fn delete(&self, id: &str) -> Result<()>;
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// Postgres-backed article store.
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn list(&self) -> Result<Vec<Article>> {
        let query = "SELECT id, title, author FROM articles ORDER BY title";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list articles")?;

        Ok(rows
            .into_iter()
            .map(|row| Article {
                id: row.get("id"),
                title: row.get("title"),
                author: row.get("author"),
            })
            .collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Article>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let query = "SELECT id, title, author FROM articles WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup article")?;

        Ok(row.map(|row| Article {
            id: row.get("id"),
            title: row.get("title"),
            author: row.get("author"),
        }))
    }

    async fn create(&self, title: &str, author: &str) -> Result<Article> {
        let query = "INSERT INTO articles (id, title, author) VALUES ($1, $2, $3)";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let id = Uuid::new_v4();
        sqlx::query(query)
            .bind(id)
            .bind(title)
            .bind(author)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert article")?;

        Ok(Article {
            id,
            title: title.to_string(),
            author: author.to_string(),
        })
    }

    async fn update(&self, id: &str, title: &str, author: &str) -> Result<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let query = "UPDATE articles SET title = $2, author = $3 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(title)
            .bind(author)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update article")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let Some(id) = parse_id(id) else {
            return Ok(());
        };
        // Deleting an already-absent article is fine.
        let query = "DELETE FROM articles WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete article")?;
        Ok(())
    }
}

/// In-memory article store for tests and local runs.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: Mutex<HashMap<Uuid, Article>>,
}

impl MemoryArticleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn list(&self) -> Result<Vec<Article>> {
        let articles = self.articles.lock().await;
        let mut all: Vec<Article> = articles.values().cloned().collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    async fn find(&self, id: &str) -> Result<Option<Article>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let articles = self.articles.lock().await;
        Ok(articles.get(&id).cloned())
    }

    async fn create(&self, title: &str, author: &str) -> Result<Article> {
        let article = Article {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
        };
        let mut articles = self.articles.lock().await;
        articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update(&self, id: &str, title: &str, author: &str) -> Result<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let mut articles = self.articles.lock().await;
        match articles.get_mut(&id) {
            Some(article) => {
                article.title = title.to_string();
                article.author = author.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let Some(id) = parse_id(id) else {
            return Ok(());
        };
        let mut articles = self.articles.lock().await;
        articles.remove(&id);
        Ok(())
    }
}
