//! Gathering control handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use roomsense_core::logic::state::GatheringReport;
use roomsense_core::GatheringAction;

use crate::{AppResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatheringRequest {
    pub action: GatheringAction,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// `new` / `append` / `stop` for one device
pub async fn update(
    State(state): State<AppState>,
    Json(req): Json<GatheringRequest>,
) -> AppResult<Json<GatheringReport>> {
    let report = state.ctx.apply_gathering(&req.device_id, req.action)?;
    Ok(Json(report))
}

/// Delete the persisted dataset file
pub async fn delete(State(state): State<AppState>) -> AppResult<Json<DeleteResponse>> {
    let deleted = state.ctx.delete_dataset()?;
    Ok(Json(DeleteResponse { deleted }))
}
