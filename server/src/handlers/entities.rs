//! Entity directory passthrough

use axum::{extract::State, Json};

use roomsense_core::logic::directory::DirectoryEntity;

use crate::{AppResult, AppState};

/// Re-fetch the directory, register new devices, return the raw list
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<DirectoryEntity>>> {
    let entities = state.directory.fetch_entities().await?;
    let added = state
        .ctx
        .refresh_devices(&entities, &state.config.anchor_entity_id);

    tracing::debug!("Entities refreshed: {} entities, {} new devices", entities.len(), added);
    Ok(Json(entities))
}
