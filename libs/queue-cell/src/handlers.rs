use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{AllocateTokenRequest, EstimateRequest, TransitionRequest};
use crate::services::clock::TariffBucket;
use crate::services::estimator;
use crate::{QueueCellState, QueueError};

/// Issue a queue token for a confirmed appointment
pub async fn allocate_token(
    State(state): State<Arc<QueueCellState>>,
    Json(request): Json<AllocateTokenRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Token request for appointment {} with provider {}",
        request.appointment_id, request.provider_id
    );

    let issued = state.allocator.allocate(request).await.map_err(|e| {
        error!("Failed to allocate token: {}", e);
        match e {
            QueueError::DuplicateToken(_) => {
                AppError::Conflict("Appointment already queued".to_string())
            }
            _ => AppError::Internal("Operation failed".to_string()),
        }
    })?;

    Ok(Json(json!({
        "success": true,
        "token_id": issued.token_id,
        "token_number": issued.token_number,
        "position": issued.position,
        "estimated_wait_minutes": issued.estimated_wait_minutes,
        "estimate_degraded": issued.estimate_degraded
    })))
}

/// Fetch one token, including terminal-state timestamps
pub async fn get_token(
    State(state): State<Arc<QueueCellState>>,
    Path(token_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    match state.store.get_token(token_id).await {
        Some(token) => Ok(Json(json!({ "token": token }))),
        None => Err(AppError::NotFound("Token not found".to_string())),
    }
}

/// Apply a status transition (call, complete, skip)
pub async fn transition_token(
    State(state): State<Arc<QueueCellState>>,
    Path(token_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Transition request for token {} to {}",
        token_id, request.target_status
    );

    let token = state
        .status_machine
        .transition(token_id, request.target_status)
        .await
        .map_err(|e| {
            error!("Failed to transition token {}: {}", token_id, e);
            match e {
                QueueError::TokenNotFound(_) => AppError::NotFound(e.to_string()),
                QueueError::ProviderBusy { .. } => AppError::Conflict(
                    "Cannot call next patient, one is already being served".to_string(),
                ),
                QueueError::IllegalTransition { .. } => AppError::BadRequest(e.to_string()),
                QueueError::DuplicateToken(_) => {
                    AppError::Internal("Operation failed".to_string())
                }
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "token": token
    })))
}

/// Live-display snapshot: serving token plus the ordered waiting list
pub async fn queue_snapshot(
    State(state): State<Arc<QueueCellState>>,
    Path((provider_id, queue_date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let snapshot = state.store.snapshot(provider_id, queue_date).await;

    Ok(Json(json!({
        "provider_id": snapshot.provider_id,
        "queue_date": snapshot.queue_date,
        "serving": snapshot.serving,
        "waiting": snapshot.waiting
    })))
}

/// Per-queue counters for the status board
pub async fn queue_stats(
    State(state): State<Arc<QueueCellState>>,
    Path((provider_id, queue_date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let stats = state.store.stats(provider_id, queue_date).await;

    Ok(Json(json!({
        "provider_id": stats.provider_id,
        "queue_date": stats.queue_date,
        "waiting": stats.waiting,
        "emergency_waiting": stats.emergency_waiting,
        "completed": stats.completed,
        "skipped": stats.skipped,
        "now_serving": stats.now_serving
    })))
}

/// Predict the wait for a hypothetical booking against the current queue
pub async fn estimate_wait_time(
    State(state): State<Arc<QueueCellState>>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<Value>, AppError> {
    let snapshot = state
        .store
        .snapshot(request.provider_id, request.queue_date)
        .await;
    let queue_length = snapshot.waiting.len() as u32;

    let hour = request
        .hour_of_day
        .unwrap_or_else(|| state.clock.hour_of_day());
    let estimate = estimator::estimate_or_default(
        queue_length,
        request.avg_consult_minutes,
        request.is_emergency,
        TariffBucket::from_hour(hour),
    );

    Ok(Json(json!({
        "predicted_wait_minutes": estimate.minutes,
        "queue_length": queue_length,
        "avg_consult_minutes": request
            .avg_consult_minutes
            .unwrap_or(estimator::DEFAULT_AVG_CONSULT_MINUTES),
        "degraded": estimate.degraded
    })))
}
