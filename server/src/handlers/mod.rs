//! HTTP handlers

pub mod health;
pub mod entities;
pub mod room;
pub mod gathering;
pub mod training;
pub mod status;
pub mod ws;
