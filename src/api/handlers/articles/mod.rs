//! Protected article routes. Every handler passes the access gate first;
//! anonymous requests are redirected to the login page with a message.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::{gate, AuthState};

pub(crate) mod storage;

pub use storage::{Article, ArticleStore, MemoryArticleStore, PgArticleStore};

pub(crate) const MISSING_ARTICLE_FIELDS_MESSAGE: &str = "Title and author are required";
pub(crate) const ARTICLE_NOT_FOUND_MESSAGE: &str = "Article not found";

#[derive(ToSchema, Deserialize, Debug)]
pub struct ArticleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

#[utoipa::path(
    get,
    path = "/articles",
    responses(
        (status = 200, description = "Article listing"),
        (status = 303, description = "Anonymous request redirected to /login")
    ),
    tag = "articles"
)]
pub(crate) async fn list_articles(
    headers: axum::http::HeaderMap,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    match store.list().await {
        Ok(articles) => render_article_list(&articles).into_response(),
        Err(err) => {
            error!("Failed to list articles: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error when receiving articles",
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    responses(
        (status = 200, description = "Single article"),
        (status = 404, description = "Unknown or malformed article id")
    ),
    tag = "articles"
)]
pub(crate) async fn show_article(
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    match store.find(&id).await {
        Ok(Some(article)) => render_article(&article).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, ARTICLE_NOT_FOUND_MESSAGE).into_response(),
        Err(err) => {
            error!("Failed to lookup article: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/articles",
    responses(
        (status = 303, description = "Article created, redirect to /articles"),
        (status = 400, description = "Title or author missing", content_type = "text/plain")
    ),
    tag = "articles"
)]
pub(crate) async fn create_article(
    headers: axum::http::HeaderMap,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
    Form(form): Form<ArticleForm>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    if form.title.is_empty() || form.author.is_empty() {
        return (StatusCode::BAD_REQUEST, MISSING_ARTICLE_FIELDS_MESSAGE).into_response();
    }

    match store.create(&form.title, &form.author).await {
        Ok(_) => Redirect::to("/articles").into_response(),
        Err(err) => {
            error!("Failed to create article: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/articles/{id}/edit",
    responses(
        (status = 200, description = "Edit form for an article"),
        (status = 404, description = "Unknown or malformed article id")
    ),
    tag = "articles"
)]
pub(crate) async fn edit_article(
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    match store.find(&id).await {
        Ok(Some(article)) => render_edit_form(&article).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, ARTICLE_NOT_FOUND_MESSAGE).into_response(),
        Err(err) => {
            error!("Failed to lookup article: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/articles/{id}/edit",
    responses(
        (status = 303, description = "Article updated, redirect to /articles")
    ),
    tag = "articles"
)]
pub(crate) async fn update_article(
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
    Form(form): Form<ArticleForm>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    // Malformed or unknown ids are a no-op; the listing redirect stands.
    match store.update(&id, &form.title, &form.author).await {
        Ok(_) => Redirect::to("/articles").into_response(),
        Err(err) => {
            error!("Failed to update article: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/articles/{id}/delete",
    responses(
        (status = 303, description = "Article deleted, redirect to /articles")
    ),
    tag = "articles"
)]
pub(crate) async fn delete_article(
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    auth: Extension<Arc<AuthState>>,
    store: Extension<Arc<dyn ArticleStore>>,
) -> Response {
    if let Err(denied) = gate::require_identity(&headers, &auth).await {
        return denied;
    }

    match store.delete(&id).await {
        Ok(()) => Redirect::to("/articles").into_response(),
        Err(err) => {
            error!("Failed to delete article: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_article_list(articles: &[Article]) -> Html<String> {
    let items: String = articles
        .iter()
        .map(|article| {
            format!(
                "<li><a href=\"/articles/{id}\">{title}</a> by {author}</li>",
                id = article.id,
                title = article.title,
                author = article.author
            )
        })
        .collect();
    Html(format!("<h1>Articles</h1><ul>{items}</ul>"))
}

fn render_article(article: &Article) -> Html<String> {
    Html(format!(
        "<h1>{title}</h1><p>by {author}</p>",
        title = article.title,
        author = article.author
    ))
}

fn render_edit_form(article: &Article) -> Html<String> {
    Html(format!(
        concat!(
            "<h1>Edit article</h1>",
            "<form method=\"post\" action=\"/articles/{id}/edit\">",
            "<input name=\"title\" value=\"{title}\">",
            "<input name=\"author\" value=\"{author}\">",
            "<button type=\"submit\">Save</button>",
            "</form>"
        ),
        id = article.id,
        title = article.title,
        author = article.author
    ))
}
