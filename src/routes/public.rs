use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: health, registration and login, and read
/// access to articles and categories.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register, POST /auth/login
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        // GET /articles?articleId&userId&title&category&startDate&endDate&sortBy&sortOrder
        // Filtered and sorted listing, see `query::ArticleQuery`.
        .route("/articles", get(handlers::list_articles))
        .route("/articles/{id}", get(handlers::get_article))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/{id}", get(handlers::get_category))
}
