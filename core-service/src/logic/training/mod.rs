//! Training Module - out-of-band model (re)training
//!
//! At most one run at a time. While a run is active the coordinator publishes
//! `TrainingState::Training` and the ingestion pipeline skips inference.

pub mod cancel;
pub mod coordinator;
pub mod fit;
pub mod metrics;
pub mod split;


use thiserror::Error;

use crate::logic::dataset::RecorderError;
use crate::logic::model::{FitError, InferenceError};

pub use cancel::CancelToken;
pub use coordinator::{TrainingCoordinator, TrainingHandle, TrainingRequest, TrainingState};
pub use fit::{ForestFitter, ModelFitter, TrainingConfig};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("a training run is already in progress")]
    AlreadyRunning,

    #[error("no training rows for device '{0}'")]
    EmptyDataset(String),

    #[error("training rows for device '{0}' cover a single room")]
    SingleClassDataset(String),

    #[error("training cancelled")]
    Cancelled,

    #[error("fit failed: {0}")]
    Fit(FitError),

    #[error("dataset unavailable: {0}")]
    Recorder(#[from] RecorderError),

    #[error("model not persisted: {0}")]
    Persist(#[from] InferenceError),

    #[error("training worker failed: {0}")]
    Worker(String),

    #[error("training coordinator stopped")]
    CoordinatorStopped,
}

impl From<FitError> for TrainingError {
    fn from(e: FitError) -> Self {
        match e {
            FitError::Cancelled => TrainingError::Cancelled,
            other => TrainingError::Fit(other),
        }
    }
}
