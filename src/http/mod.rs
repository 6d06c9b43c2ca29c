use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::AppState;

mod error;
mod handlers;
mod routes;

pub use error::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::posts())
        .merge(routes::comments())
        .merge(routes::files())
        .layer(DefaultBodyLimit::max(state.upload_max_bytes))
        .with_state(state)
}
