//! services/api/src/web/mod.rs
//!
//! HTTP layer: payloads, handlers and the router that wires them together.

pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use rest::*;
use state::AppState;
use std::sync::Arc;

/// Builds the API router with every planner route bound to the shared state.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/schedule/today", get(today_handler))
        .route("/schedule/shuffle", post(shuffle_handler))
        .route("/schedule/reshuffle", post(reshuffle_handler))
        .route("/schedule/temporary", post(temporary_sessions_handler))
        .route("/schedule/history", get(history_handler))
        .route("/template", get(template_handler))
        .route("/template/{id}/toggle", post(toggle_session_handler))
        .route("/template/{id}/units", put(set_session_units_handler))
        .route("/selection", get(selection_handler))
        .route("/selection/groups", put(select_groups_handler))
        .route("/selection/units/{unit_number}/toggle", post(toggle_unit_handler))
        .route("/selection/chunks/{id}/toggle", post(toggle_chunk_handler))
        .route("/selection/chunks/{id}/mandatory", post(toggle_mandatory_handler))
        .route("/selection/used/reset", post(reset_used_handler))
        .route("/settings", get(settings_handler))
        .route("/settings/chunk-size", put(set_chunk_size_handler))
        .route("/settings/chunking", put(set_chunking_handler))
        .route("/review", get(list_reviews_handler).post(add_review_handler).delete(clear_reviews_handler))
        .route("/review/{id}", delete(remove_review_handler))
        .route("/units", get(list_units_handler))
        .with_state(app_state)
}
