//! Feature Vector - Core data structure for classifier input
//!
//! One RSSI value per anchor, in [`AnchorSet`] order, tagged with the layout
//! hash it was built against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::layout::{canonicalize, AnchorSet, CodecError};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// CRC32 of the anchor layout (for mismatch detection)
    pub layout_hash: u32,
    /// RSSI values in anchor order
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Check this vector was built against `anchors`
    pub fn is_compatible(&self, anchors: &AnchorSet) -> bool {
        self.layout_hash == anchors.layout_hash() && self.values.len() == anchors.len()
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encode `(display name, rssi)` readings into a vector aligned to `anchors`.
///
/// Readings for anchors outside the set are ignored. Fails when an anchor has
/// no reading, or when two display names canonicalize to the same key.
pub fn encode<'a, I>(readings: I, anchors: &AnchorSet) -> Result<FeatureVector, CodecError>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut by_key: HashMap<String, f64> = HashMap::new();
    for (name, rssi) in readings {
        let key = canonicalize(name);
        if by_key.insert(key.clone(), rssi).is_some() {
            return Err(CodecError::DuplicateAnchor(key));
        }
    }

    let values = anchors
        .iter()
        .map(|anchor| {
            by_key
                .get(anchor)
                .copied()
                .ok_or_else(|| CodecError::MissingAnchorReading(anchor.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureVector {
        layout_hash: anchors.layout_hash(),
        values,
    })
}
