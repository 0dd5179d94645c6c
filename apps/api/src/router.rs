use std::sync::Arc;

use axum::{routing::get, Router};

use queue_cell::{create_queue_router, QueueCellState};

pub fn create_router(state: Arc<QueueCellState>) -> Router {
    Router::new()
        .route("/", get(|| async { "GovCare Queue API is running!" }))
        .nest("/queue", create_queue_router(state))
}
