//! Trained model artifact
//!
//! A fitted classifier plus the anchor layout it expects and the validation
//! stats of the run that produced it. Persisted as JSON.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::logic::features::AnchorSet;
use super::forest::{Classifier, ForestParams, RandomForest};
use super::inference::InferenceError;
use super::label::Room;

/// Held-out validation stats (positive class: bedroom)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingStats {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub device_id: String,
    pub anchors: Vec<String>,
    pub layout_hash: u32,
    pub params: ForestParams,
    pub stats: TrainingStats,
    pub training_rows: usize,
    pub trained_at: DateTime<Utc>,
    forest: RandomForest,
}

impl TrainedModel {
    pub fn new(
        device_id: impl Into<String>,
        anchors: &AnchorSet,
        forest: RandomForest,
        stats: TrainingStats,
        training_rows: usize,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            anchors: anchors.as_slice().to_vec(),
            layout_hash: anchors.layout_hash(),
            params: forest.params(),
            stats,
            training_rows,
            trained_at: Utc::now(),
            forest,
        }
    }

    /// Predict a room for one feature row in anchor order
    pub fn predict(&self, features: &[f64]) -> Room {
        let class = self.forest.predict_row(ArrayView1::from(features));
        Room::from_index(class).unwrap_or(Room::ALL[0])
    }

    /// Same anchor order and a forest trained on that many columns
    pub fn is_compatible(&self, anchors: &AnchorSet) -> bool {
        self.layout_hash == anchors.layout_hash() && self.forest.n_features() == anchors.len()
    }

    /// Write atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<(), InferenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        log::info!("Model saved to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let data = fs::read(path)?;
        let model: TrainedModel = serde_json::from_slice(&data)?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::testing::{home_anchors, tiny_model};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let anchors = home_anchors();
        let model = tiny_model(&anchors);

        model.save(&path).unwrap();
        let loaded = TrainedModel::load(&path).unwrap();

        assert_eq!(loaded.device_id, "ble-1");
        assert_eq!(loaded.anchors, vec!["bedroom", "living-room", "living-room-2"]);
        assert!(loaded.is_compatible(&anchors));
        assert_eq!(loaded.predict(&[-60.0, -80.0, -80.0]), model.predict(&[-60.0, -80.0, -80.0]));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_layout_compatibility() {
        let anchors = home_anchors();
        let other = AnchorSet::from_names(["bedroom", "living-room"]).unwrap();
        let model = tiny_model(&anchors);

        assert!(model.is_compatible(&anchors));
        assert!(!model.is_compatible(&other));
    }

    #[test]
    fn test_forest_width_must_match_anchors() {
        use crate::logic::training::CancelToken;
        use ndarray::array;
        use rand::{rngs::StdRng, SeedableRng};

        let anchors = home_anchors();
        let x = array![[-60.0, -80.0], [-80.0, -62.0], [-61.0, -79.0], [-79.0, -63.0]];
        let y = [1, 0, 1, 0];
        let mut rng = StdRng::seed_from_u64(3);
        let narrow = RandomForest::fit(x.view(), &y, ForestParams::default(), &mut rng, &CancelToken::new()).unwrap();

        let model = TrainedModel::new("ble-1", &anchors, narrow, TrainingStats::default(), 4);
        assert_eq!(model.layout_hash, anchors.layout_hash());
        assert!(!model.is_compatible(&anchors));
    }
}
