//! Central Configuration Constants
//!
//! Single source of truth for library defaults. The server overrides these
//! from its environment.

use std::path::PathBuf;

/// Directory entity that exposes the anchor node list
pub const DEFAULT_ANCHOR_ENTITY_ID: &str = "status-cluster-size";

/// Training dataset file name (inside the data directory)
pub const DATASET_FILE_NAME: &str = "room-location.csv";

/// Serialized model file name (inside the data directory)
pub const MODEL_FILE_NAME: &str = "random_forest.json";

/// Fraction of rows held out for validation
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// Randomized search trial count
pub const DEFAULT_SEARCH_ITERATIONS: usize = 5;

/// Cross-validation folds per search trial
pub const DEFAULT_CV_FOLDS: usize = 5;

/// Forest size used when no search is requested
pub const DEFAULT_N_ESTIMATORS: usize = 10;

/// Tree depth used when no search is requested
pub const DEFAULT_MAX_DEPTH: usize = 7;

/// Per-subscriber outbound queue length
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// Column names that precede the anchor columns in the dataset file
pub const DEVICE_ID_COLUMN: &str = "deviceId";
pub const ROOM_COLUMN: &str = "room";

/// File locations for the two persisted artifacts
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub dataset: PathBuf,
    pub model: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            dataset: dir.join(DATASET_FILE_NAME),
            model: dir.join(MODEL_FILE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_share_directory() {
        let paths = DataPaths::in_dir("data");
        assert_eq!(paths.dataset, PathBuf::from("data/room-location.csv"));
        assert_eq!(paths.model, PathBuf::from("data/random_forest.json"));
    }
}
