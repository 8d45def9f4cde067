use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::handler::{self, AppState};
use crate::store::BookmarkStore;

/// Assembles the full service router. Browser extensions call the API
/// cross-origin, so CORS is wide open.
pub fn router<S: BookmarkStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    Router::new()
        .route("/info", get(handler::info::<S>))
        .route("/bookmarks", post(handler::create_bookmarks::<S>))
        .route("/bookmarks/:id", get(handler::get_bookmarks::<S>))
        .route("/bookmarks/:id", put(handler::update_bookmarks::<S>))
        .route("/bookmarks/:id/lastUpdated", get(handler::last_updated::<S>))
        .route("/bookmarks/:id/version", get(handler::version::<S>))
        .layer(cors)
        .with_state(state)
}
