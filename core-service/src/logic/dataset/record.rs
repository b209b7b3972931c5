use serde::Serialize;

use crate::logic::features::{AnchorSet, FeatureVector};
use crate::logic::model::Room;
use super::RecorderError;

/// One labeled capture: the user-assigned room, never a model prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRow {
    pub device_id: String,
    pub room: Room,
    pub features: Vec<f64>,
}

impl TrainingRow {
    pub fn new(device_id: impl Into<String>, room: Room, vector: FeatureVector) -> Self {
        Self {
            device_id: device_id.into(),
            room,
            features: vector.into_values(),
        }
    }
}

/// Ordered rows sharing one anchor layout
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingDataset {
    anchors: AnchorSet,
    rows: Vec<TrainingRow>,
}

impl TrainingDataset {
    pub fn new(anchors: AnchorSet) -> Self {
        Self {
            anchors,
            rows: Vec::new(),
        }
    }

    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append in insertion order. No dedup; width must match the layout.
    pub fn push(&mut self, row: TrainingRow) -> Result<(), RecorderError> {
        if row.features.len() != self.anchors.len() {
            return Err(RecorderError::RowWidth {
                expected: self.anchors.len(),
                actual: row.features.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn for_device<'a>(&'a self, device_id: &'a str) -> impl Iterator<Item = &'a TrainingRow> + 'a {
        self.rows.iter().filter(move |row| row.device_id == device_id)
    }
}
