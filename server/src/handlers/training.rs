//! Training control handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use roomsense_core::logic::training::TrainingRequest;

use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingAccepted {
    pub status: &'static str,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Submit a run; progress is pushed over `/ws`
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<TrainingRequest>,
) -> AppResult<(StatusCode, Json<TrainingAccepted>)> {
    let device_id = req.device_id.clone();
    state.ctx.train(req).await?;

    tracing::info!("Training accepted for {}", device_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(TrainingAccepted {
            status: "started",
            device_id,
        }),
    ))
}

pub async fn cancel(State(state): State<AppState>) -> AppResult<Json<CancelResponse>> {
    let cancelled = state.ctx.cancel_training().await?;
    Ok(Json(CancelResponse { cancelled }))
}
