//! Shared fixtures for unit tests

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::logic::dataset::{TrainingDataset, TrainingRow};
use crate::logic::features::AnchorSet;
use crate::logic::model::{ForestParams, RandomForest, Room, TrainedModel, TrainingStats};
use crate::logic::training::CancelToken;

pub(crate) fn home_anchors() -> AnchorSet {
    AnchorSet::from_names(["Bedroom", "Living Room", "Living Room 2"]).unwrap()
}

/// Clearly separated captures in `[bedroom, living-room, living-room-2]` order
pub(crate) fn labeled_rows(device_id: &str, per_room: usize) -> Vec<TrainingRow> {
    let mut rows = Vec::with_capacity(per_room * 2);
    for j in 0..per_room {
        let jitter = (j % 5) as f64;
        rows.push(TrainingRow {
            device_id: device_id.to_string(),
            room: Room::Bedroom,
            features: vec![-60.0 - jitter, -80.0 + jitter, -78.0 + jitter],
        });
        rows.push(TrainingRow {
            device_id: device_id.to_string(),
            room: Room::LivingRoom,
            features: vec![-80.0 - jitter, -62.0 + jitter, -65.0 + jitter],
        });
    }
    rows
}

pub(crate) fn labeled_dataset(anchors: &AnchorSet, device_id: &str, per_room: usize) -> TrainingDataset {
    let mut dataset = TrainingDataset::new(anchors.clone());
    for row in labeled_rows(device_id, per_room) {
        dataset.push(row).unwrap();
    }
    dataset
}

/// Small forest fitted on `labeled_rows`, owned by device "ble-1"
pub(crate) fn tiny_model(anchors: &AnchorSet) -> TrainedModel {
    let rows = labeled_rows("ble-1", 10);
    let flat: Vec<f64> = rows.iter().flat_map(|row| row.features.iter().copied()).collect();
    let x = Array2::from_shape_vec((rows.len(), anchors.len()), flat).unwrap();
    let y: Vec<usize> = rows.iter().map(|row| row.room.index()).collect();

    let mut rng = StdRng::seed_from_u64(7);
    let forest = RandomForest::fit(
        x.view(),
        &y,
        ForestParams::default(),
        &mut rng,
        &CancelToken::new(),
    )
    .unwrap();

    let stats = TrainingStats {
        accuracy: 1.0,
        precision: 1.0,
        recall: 1.0,
    };
    TrainedModel::new("ble-1", anchors, forest, stats, rows.len())
}
