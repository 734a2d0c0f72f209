pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::comparison::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/resume/versions/compare",
            post(handlers::handle_compare),
        )
        .route(
            "/api/resume/versions/history",
            get(handlers::handle_history),
        )
        .with_state(state)
}
