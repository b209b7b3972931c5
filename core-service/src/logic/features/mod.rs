//! Features Module - Feature Codec
//!
//! Turns a raw per-anchor RSSI reading set into a fixed-shape vector whose
//! column order is defined by the [`AnchorSet`].

pub mod layout;
pub mod vector;


// Re-export common types
pub use layout::{canonicalize, AnchorSet, CodecError};
pub use vector::{encode, FeatureVector};
