//! Inference Engine - live model slot
//!
//! Exactly one model is current at a time. `swap` replaces it with a single
//! assignment under the write lock; predictions clone the `Arc` first, so a
//! swap never invalidates a prediction already in flight.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::logic::features::{AnchorSet, FeatureVector};
use super::artifact::{TrainedModel, TrainingStats};
use super::label::Room;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("no model loaded")]
    ModelNotLoaded,

    #[error("feature layout mismatch: model {expected:08x}, input {actual:08x}")]
    LayoutMismatch { expected: u32, actual: u32 },

    #[error("model io: {0}")]
    Io(#[from] std::io::Error),

    #[error("model format: {0}")]
    Serde(#[from] serde_json::Error),
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Engine Status for the status endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub model_loaded: bool,
    pub device_id: Option<String>,
    pub stats: Option<TrainingStats>,
    pub trained_at: Option<DateTime<Utc>>,
    pub inference_count: u64,
    pub avg_latency_us: f64,
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Default)]
pub struct InferenceEngine {
    slot: RwLock<Option<Arc<TrainedModel>>>,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: TrainedModel) -> Self {
        let engine = Self::new();
        engine.swap(model);
        engine
    }

    /// Predict a room. Fails with `ModelNotLoaded` until a model is swapped in.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Room, InferenceError> {
        let start = Instant::now();
        let model = self.current().ok_or(InferenceError::ModelNotLoaded)?;

        if vector.layout_hash != model.layout_hash {
            return Err(InferenceError::LayoutMismatch {
                expected: model.layout_hash,
                actual: vector.layout_hash,
            });
        }

        let room = model.predict(vector.as_slice());

        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(room)
    }

    /// Replace the current model, returning the previous one
    pub fn swap(&self, model: TrainedModel) -> Option<Arc<TrainedModel>> {
        let model = Arc::new(model);
        log::info!(
            "Model swapped in (device {}, {} rows, accuracy {:.3})",
            model.device_id,
            model.training_rows,
            model.stats.accuracy
        );
        self.slot.write().replace(model)
    }

    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.slot.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Load the persisted model at startup.
    ///
    /// Returns `Ok(false)` when no artifact exists yet; inference stays
    /// unavailable until the first training run.
    pub fn load_from(&self, path: &Path, anchors: &AnchorSet) -> Result<bool, InferenceError> {
        if !path.exists() {
            log::info!("No model at {:?} - inference unavailable until first training", path);
            return Ok(false);
        }

        log::info!("Loading model from: {:?}", path);
        let model = TrainedModel::load(path)?;

        if !model.is_compatible(anchors) {
            return Err(InferenceError::LayoutMismatch {
                expected: anchors.layout_hash(),
                actual: model.layout_hash,
            });
        }

        self.swap(model);
        Ok(true)
    }

    pub fn status(&self) -> EngineStatus {
        let current = self.current();
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);

        EngineStatus {
            model_loaded: current.is_some(),
            device_id: current.as_ref().map(|m| m.device_id.clone()),
            stats: current.as_ref().map(|m| m.stats),
            trained_at: current.as_ref().map(|m| m.trained_at),
            inference_count: count,
            avg_latency_us: if count > 0 { sum as f64 / count as f64 } else { 0.0 },
        }
    }
}
