use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/api/v1/posts", post(handlers::create_post))
        .route("/api/v1/posts", get(handlers::list_posts))
        .route("/api/v1/posts/search", get(handlers::search_posts))
        .route("/api/v1/posts/:id", get(handlers::get_post))
        .route("/api/v1/posts/:id", put(handlers::update_post))
        .route("/api/v1/posts/:id", delete(handlers::delete_post))
        .route("/api/v1/posts/:id/like", post(handlers::like_post))
}

pub fn comments() -> Router<AppState> {
    // one param name for the segment: GET takes a post id, PUT/DELETE a
    // comment id, but matchit rejects mixed names on the same position
    Router::new()
        .route("/api/v1/comments", post(handlers::create_comment))
        .route("/api/v1/comments/:id", put(handlers::update_comment))
        .route("/api/v1/comments/:id", delete(handlers::delete_comment))
        .route("/api/v1/comments/:id", get(handlers::list_comments))
}

pub fn files() -> Router<AppState> {
    Router::new().route("/api/v1/files/:id/download", get(handlers::download_file))
}
