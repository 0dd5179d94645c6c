use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    allocate_token, estimate_wait_time, get_token, queue_snapshot, queue_stats, transition_token,
};
use crate::QueueCellState;

pub fn create_queue_router(state: Arc<QueueCellState>) -> Router {
    Router::new()
        .route("/tokens", post(allocate_token))
        .route("/tokens/{token_id}", get(get_token))
        .route("/tokens/{token_id}/status", post(transition_token))
        .route("/queues/{provider_id}/{queue_date}", get(queue_snapshot))
        .route(
            "/queues/{provider_id}/{queue_date}/stats",
            get(queue_stats),
        )
        .route("/estimate", post(estimate_wait_time))
        .with_state(state)
}
