use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes open to any user holding a valid token. The auth middleware layered on this
/// router resolves the caller before the handler runs; ownership of the targeted
/// article is checked inside the update and delete handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/profile
        .route("/auth/profile", get(handlers::get_profile))
        // POST /articles
        // The new article's author is the caller.
        .route("/articles", post(handlers::create_article))
        // PUT/DELETE /articles/{id}
        // Author or admin only.
        .route(
            "/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
}
