//! Broadcast Module - subscriber fan-out
//!
//! Pushes room predictions and training lifecycle events to every connected
//! UI client, in subscription order.

pub mod hub;
pub mod messages;

pub use hub::{BroadcastHub, Subscription, SubscriberId};
pub use messages::{ClientMessage, RoomPayload, ServerMessage, TrainingPayload, TrainingPhase};
