//! Application context
//!
//! One explicit object shared by the ingestion loop and the request
//! handlers. Ownership per field:
//!
//! - `anchors`: fixed at startup, read-only
//! - `devices`: written by room / gathering commands and directory refresh
//! - `engine`: model slot written only by the training coordinator (and the
//!   startup load)
//! - `recorder`: appended by the ingestion pipeline, started / stopped by
//!   gathering commands, snapshotted by the coordinator
//! - `hub`: subscribers added and removed by connection tasks
//! - `training`: state written only by the coordinator actor

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DataPaths;
use crate::logic::broadcast::BroadcastHub;
use crate::logic::dataset::{RecorderError, RecorderStatus, TrainingDataRecorder};
use crate::logic::devices::{Device, DeviceRegistry};
use crate::logic::directory::{self, DirectoryEntity};
use crate::logic::features::AnchorSet;
use crate::logic::model::{EngineStatus, InferenceEngine, InferenceError, Room, RoomParseError};
use crate::logic::training::{
    ModelFitter, TrainingCoordinator, TrainingError, TrainingHandle, TrainingRequest, TrainingState,
};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown device '{0}'")]
    UnknownDevice(String),

    #[error(transparent)]
    InvalidRoom(#[from] RoomParseError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Training(#[from] TrainingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatheringAction {
    /// Discard the persisted dataset and start empty
    New,
    /// Resume from the persisted dataset
    Append,
    /// Persist and stop gathering for this device
    Stop,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatheringReport {
    pub device: Device,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub training: TrainingState,
    pub anchors: Vec<String>,
    pub model: EngineStatus,
    pub dataset: RecorderStatus,
    pub devices: Vec<Device>,
    pub subscribers: usize,
}

pub struct AppContext {
    pub anchors: AnchorSet,
    pub devices: DeviceRegistry,
    pub engine: Arc<InferenceEngine>,
    pub recorder: Arc<TrainingDataRecorder>,
    pub hub: Arc<BroadcastHub>,
    pub training: TrainingHandle,
    pub paths: DataPaths,
}

impl AppContext {
    /// Build the context and spawn the training coordinator on the current
    /// runtime. No model is loaded; see `load_model`.
    pub fn new(anchors: AnchorSet, paths: DataPaths, fitter: Arc<dyn ModelFitter>) -> Self {
        let engine = Arc::new(InferenceEngine::new());
        let recorder = Arc::new(TrainingDataRecorder::new(anchors.clone(), &paths.dataset));
        let hub = Arc::new(BroadcastHub::default());

        let training = TrainingCoordinator::new(
            Arc::clone(&engine),
            Arc::clone(&recorder),
            Arc::clone(&hub),
            fitter,
            &paths.model,
        )
        .spawn();

        log::info!("Context ready with {} anchors: {:?}", anchors.len(), anchors.as_slice());

        Self {
            anchors,
            devices: DeviceRegistry::new(),
            engine,
            recorder,
            hub,
            training,
            paths,
        }
    }

    /// Load the persisted model; `Ok(false)` when none exists yet
    pub fn load_model(&self) -> Result<bool, InferenceError> {
        self.engine.load_from(&self.paths.model, &self.anchors)
    }

    /// Register trackable devices from a directory listing. The anchor set
    /// is never changed after startup; a differing list is only logged.
    pub fn refresh_devices(&self, entities: &[DirectoryEntity], anchor_entity_id: &str) -> usize {
        match directory::anchors_from(entities, anchor_entity_id) {
            Ok(anchors) if anchors != self.anchors => log::warn!(
                "Directory anchors changed to {:?}; keeping {:?}",
                anchors.as_slice(),
                self.anchors.as_slice()
            ),
            Ok(_) => {}
            Err(e) => log::warn!("Anchor list not readable on refresh: {}", e),
        }

        let added = self.devices.register(directory::trackable_ids(entities));
        log::info!("Devices refreshed: {} new, {} total", added, self.devices.len());
        added
    }

    pub fn set_room(&self, device_id: &str, room_name: &str) -> Result<Device, CommandError> {
        let room: Room = room_name.parse()?;
        let device = self
            .devices
            .set_room(device_id, room)
            .ok_or_else(|| CommandError::UnknownDevice(device_id.to_string()))?;
        log::info!("Device {} assigned to {}", device_id, room);
        Ok(device)
    }

    pub fn apply_gathering(
        &self,
        device_id: &str,
        action: GatheringAction,
    ) -> Result<GatheringReport, CommandError> {
        if !self.devices.contains(device_id) {
            return Err(CommandError::UnknownDevice(device_id.to_string()));
        }

        let (gathering, rows) = match action {
            GatheringAction::New => {
                self.recorder.start_new()?;
                (true, 0)
            }
            GatheringAction::Append => (true, self.recorder.start_append()?),
            GatheringAction::Stop => (false, self.recorder.stop()?),
        };

        let device = self
            .devices
            .set_gathering(device_id, gathering)
            .ok_or_else(|| CommandError::UnknownDevice(device_id.to_string()))?;
        log::info!("Gathering {:?} for {} ({} rows)", action, device_id, rows);

        Ok(GatheringReport { device, rows })
    }

    /// Delete the persisted dataset file
    pub fn delete_dataset(&self) -> Result<bool, CommandError> {
        Ok(self.recorder.remove_persisted()?)
    }

    pub async fn train(&self, request: TrainingRequest) -> Result<(), CommandError> {
        Ok(self.training.train(request).await?)
    }

    pub async fn cancel_training(&self) -> Result<bool, CommandError> {
        Ok(self.training.cancel().await?)
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            training: self.training.state(),
            anchors: self.anchors.as_slice().to_vec(),
            model: self.engine.status(),
            dataset: self.recorder.status(),
            devices: self.devices.list(),
            subscribers: self.hub.len(),
        }
    }
}
