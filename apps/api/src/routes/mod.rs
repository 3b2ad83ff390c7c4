pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // A full batch is max_candidates resumes plus the job description, each
    // up to the file size cap; axum's 2 MB default body limit is far too
    // small for that.
    let body_limit =
        state.config.limits.max_file_bytes * (state.config.limits.max_candidates + 1);
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/roles", get(handlers::handle_list_roles))
        .route("/api/v1/rank", post(handlers::handle_rank))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
