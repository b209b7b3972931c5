//! Dataset Module - Training Data Recorder
//!
//! Accumulates labeled feature rows captured from live traffic into one
//! process-wide dataset and persists it as CSV (`deviceId, room, <anchors>`).

pub mod record;
pub mod storage;
pub mod recorder;


use thiserror::Error;

pub use record::{TrainingDataset, TrainingRow};
pub use recorder::{RecorderStatus, TrainingDataRecorder};

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Persisted columns differ from the live anchor schema
    #[error("dataset columns {found:?} do not match expected {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// No gathering session has been started
    #[error("no active dataset - start gathering first")]
    NotGathering,

    #[error("row has {actual} features, layout expects {expected}")]
    RowWidth { expected: usize, actual: usize },

    #[error("dataset line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("dataset io: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset csv: {0}")]
    Csv(#[from] csv::Error),
}
