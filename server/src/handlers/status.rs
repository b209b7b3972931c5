//! Runtime status

use axum::{extract::State, Json};

use roomsense_core::logic::state::StatusReport;

use crate::AppState;

pub async fn get(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.ctx.status())
}
