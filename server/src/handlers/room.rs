//! Room assignment handler

use axum::{extract::State, Json};
use serde::Deserialize;

use roomsense_core::logic::devices::Device;

use crate::{AppResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoomRequest {
    pub name: String,
    pub device_id: String,
}

pub async fn assign(
    State(state): State<AppState>,
    Json(req): Json<AssignRoomRequest>,
) -> AppResult<Json<Device>> {
    let device = state.ctx.set_room(&req.device_id, &req.name)?;
    Ok(Json(device))
}
