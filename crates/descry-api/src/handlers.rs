//! Route handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use descry_core::{CorrelationId, ModelSelector, NewJob};

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /add_job`.
#[derive(Debug, Deserialize)]
pub struct AddJobRequest {
    pub correlation_id: i64,
    pub input_path: String,
    /// Defaults to `Florence-2-base`.
    pub model: Option<String>,
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "status": "HELLO WORLD" }))
}

pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let queue_length = state.service.count().await?;
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "queue_length": queue_length,
    })))
}

pub async fn add_job(
    State(state): State<AppState>,
    Json(req): Json<AddJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let model = match req.model.as_deref() {
        Some(name) => name.parse::<ModelSelector>()?,
        None => ModelSelector::default(),
    };
    state
        .service
        .enqueue(NewJob::new(req.correlation_id, req.input_path, model))
        .await?;
    Ok(Json(json!({ "status": "Job added to queue" })))
}

pub async fn remove_job(
    State(state): State<AppState>,
    Path(correlation_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.remove(CorrelationId(correlation_id)).await?;
    Ok(Json(json!({ "status": "Job removed from queue" })))
}

pub async fn check_queue(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let queue_length = state.service.count().await?;
    Ok(Json(json!({ "queue_length": queue_length })))
}
