//! Per-event pipeline

use std::sync::Arc;

use tokio::sync::watch;

use crate::logic::broadcast::ServerMessage;
use crate::logic::dataset::TrainingRow;
use crate::logic::features::{encode, CodecError};
use crate::logic::model::{InferenceError, Room};
use crate::logic::state::AppContext;
use crate::logic::training::TrainingState;
use super::wire::{MeasurementEvent, UpstreamMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// A training run is active; events are not buffered
    Training,
    /// Device not registered from the directory yet
    UnknownDevice,
    Codec(CodecError),
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Handled {
        device_id: String,
        /// `None` while no model is loaded
        room: Option<Room>,
        /// Dataset size after the append, when a row was recorded
        recorded: Option<usize>,
    },
    Dropped(DropReason),
    /// Not an entity update
    Ignored,
}

pub struct IngestPipeline {
    ctx: Arc<AppContext>,
    training: watch::Receiver<TrainingState>,
}

impl IngestPipeline {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let training = ctx.training.subscribe_state();
        Self { ctx, training }
    }

    #[cfg(test)]
    pub(crate) fn with_state(ctx: Arc<AppContext>, training: watch::Receiver<TrainingState>) -> Self {
        Self { ctx, training }
    }

    pub fn handle_text(&self, text: &str) -> Outcome {
        match UpstreamMessage::parse(text) {
            Ok(UpstreamMessage::EntityUpdate(event)) => self.handle_event(event),
            Ok(UpstreamMessage::Other) => Outcome::Ignored,
            Err(e) => {
                log::warn!("Malformed upstream message: {}", e);
                Outcome::Dropped(DropReason::Malformed(e.to_string()))
            }
        }
    }

    pub fn handle_event(&self, event: MeasurementEvent) -> Outcome {
        if *self.training.borrow() == TrainingState::Training {
            log::debug!("Dropped update for {}: training in progress", event.id);
            return Outcome::Dropped(DropReason::Training);
        }

        let Some(device) = self.ctx.devices.get(&event.id) else {
            log::debug!("Dropped update for {}: unknown device", event.id);
            return Outcome::Dropped(DropReason::UnknownDevice);
        };

        let vector = match encode(event.readings(), &self.ctx.anchors) {
            Ok(vector) => vector,
            Err(e) => {
                log::warn!("Dropped update for {}: {}", event.id, e);
                return Outcome::Dropped(DropReason::Codec(e));
            }
        };

        let room = match self.ctx.engine.predict(&vector) {
            Ok(room) => {
                self.ctx
                    .hub
                    .publish(ServerMessage::room(&event.id, room, event.state_label()));
                Some(room)
            }
            Err(InferenceError::ModelNotLoaded) => {
                log::debug!("No model loaded, prediction skipped for {}", event.id);
                None
            }
            Err(e) => {
                log::warn!("Prediction failed for {}: {}", event.id, e);
                None
            }
        };

        // Label is the user-assigned room, never the prediction
        let recorded = device.gathering_label().and_then(|label| {
            match self.ctx.recorder.append(TrainingRow::new(&event.id, label, vector)) {
                Ok(rows) => Some(rows),
                Err(e) => {
                    log::warn!("Training row for {} not recorded: {}", event.id, e);
                    None
                }
            }
        });

        Outcome::Handled {
            device_id: event.id,
            room,
            recorded,
        }
    }
}
