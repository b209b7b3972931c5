//! RoomSense Core - BLE Room Classification Engine
//!
//! Classifies which room a tracked device is in from the RSSI readings that
//! fixed anchor nodes report, and re-trains the classifier from labeled rows
//! captured out of live traffic.
//!
//! # Architecture
//!
//! ```text
//!  upstream events ──► ingest ──► features ──► model ──► broadcast ──► subscribers
//!                         │                      ▲
//!                         ▼                      │ swap
//!                      dataset ───────────► training (worker thread)
//! ```

pub mod constants;
pub mod logic;

pub use logic::state::{AppContext, CommandError, GatheringAction};
