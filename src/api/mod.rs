use crate::api::handlers::{articles, auth, health, root, theme};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: auth::AppConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let identity: Arc<dyn auth::IdentityStore> = Arc::new(auth::PgIdentityStore::new(pool.clone()));
    let article_store: Arc<dyn articles::ArticleStore> =
        Arc::new(articles::PgArticleStore::new(pool));
    // Sessions live in-process; the trait seam admits a distributed store.
    let sessions: Arc<dyn auth::SessionStore> = Arc::new(auth::MemorySessionStore::new());
    let auth_state = Arc::new(auth::AuthState::new(config, identity, sessions));

    let app = router(auth_state, article_store).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Build the application router around the injected stores.
#[must_use]
pub fn router(
    auth_state: Arc<auth::AuthState>,
    article_store: Arc<dyn articles::ArticleStore>,
) -> Router {
    Router::new()
        .route("/", get(root::index))
        .route("/health", get(health::health))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/set-theme/:theme", get(theme::set_theme))
        .route(
            "/articles",
            get(articles::list_articles).post(articles::create_article),
        )
        .route("/articles/:id", get(articles::show_article))
        .route(
            "/articles/:id/edit",
            get(articles::edit_article).post(articles::update_article),
        )
        .route("/articles/:id/delete", post(articles::delete_article))
        .layer(Extension(auth_state))
        .layer(Extension(article_store))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
