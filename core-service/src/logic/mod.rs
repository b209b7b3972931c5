//! Logic Module - Pipeline components
//!
//! - `features/` - Feature Codec (anchor canonicalization, vector encoding)
//! - `model/` - Inference Engine and the random-forest classifier
//! - `dataset/` - Training Data Recorder (CSV-backed)
//! - `ingest/` - Upstream connection and per-event pipeline
//! - `broadcast/` - Subscriber fan-out and wire messages
//! - `training/` - Training Coordinator (actor + worker thread)

pub mod features;
pub mod model;
pub mod dataset;
pub mod ingest;
pub mod broadcast;
pub mod training;
pub mod devices;
pub mod directory;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
