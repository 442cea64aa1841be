use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Category mutations. The router sits behind the same auth middleware as the
/// authenticated routes; each handler then applies `policy::require_admin`, so a
/// non-admin caller gets 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /categories
        .route("/categories", post(handlers::create_category))
        // PUT/DELETE /categories/{id}
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
}
