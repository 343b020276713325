use crate::http::handlers::{
    get_machine_stats, get_top_defect_lines, healthz, metrics, post_batch, HttpState,
};
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

pub fn router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/events/batch", post(post_batch))
        .route("/events/stats", get(get_machine_stats))
        .route("/events/stats/top-defect-lines", get(get_top_defect_lines))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

// Returned as a plain Router so the caller owns server startup and graceful
// shutdown.
pub fn build_router(state: Arc<HttpState>) -> Router {
    router(state)
}
