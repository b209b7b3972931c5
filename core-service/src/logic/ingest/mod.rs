//! Ingest Module - upstream event stream
//!
//! One persistent WebSocket connection to the presence gateway. Each entity
//! update flows through `IngestPipeline`: training check, device lookup,
//! encode, predict, broadcast and (when gathering) record.

pub mod client;
pub mod pipeline;
pub mod wire;

#[cfg(test)]
mod tests;

pub use client::{IngestClient, IngestError};
pub use pipeline::{DropReason, IngestPipeline, Outcome};
pub use wire::{MeasuredValue, MeasurementEvent, UpstreamMessage, UpstreamRequest};
