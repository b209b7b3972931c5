//! Model Module - Inference Engine
//!
//! Holds the live classifier behind a swap-only slot.
//! The learning algorithm sits behind the [`Classifier`] trait.

pub mod label;
pub mod forest;
pub mod artifact;
pub mod inference;

// Re-export common types
pub use label::{Room, RoomParseError};
pub use forest::{Classifier, FitError, ForestParams, RandomForest};
pub use artifact::{TrainedModel, TrainingStats};
pub use inference::{EngineStatus, InferenceEngine, InferenceError};
