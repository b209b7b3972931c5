//! Configuration module

use std::env;
use std::path::PathBuf;

use roomsense_core::constants::DEFAULT_ANCHOR_ENTITY_ID;
use roomsense_core::logic::training::TrainingConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Entity directory base URL
    pub rest_url: String,

    /// Upstream event stream URL
    pub ws_url: String,

    /// Server port
    pub port: u16,

    /// Holds the dataset CSV and the model artifact
    pub data_dir: PathBuf,

    /// Directory entity whose `attributes.nodes` lists the anchors
    pub anchor_entity_id: String,

    pub training: TrainingConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = TrainingConfig::default();

        Self {
            rest_url: env::var("ROOM_ASSISTANT_REST_URL")
                .unwrap_or_else(|_| "http://localhost:6415/api".to_string()),

            ws_url: env::var("ROOM_ASSISTANT_WS_URL")
                .unwrap_or_else(|_| "ws://localhost:6415/api".to_string()),

            port: parsed("PORT").unwrap_or(8000),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),

            anchor_entity_id: env::var("ANCHOR_ENTITY_ID")
                .unwrap_or_else(|_| DEFAULT_ANCHOR_ENTITY_ID.to_string()),

            training: TrainingConfig {
                holdout_fraction: parsed("TRAINING_HOLDOUT").unwrap_or(defaults.holdout_fraction),
                search_iterations: parsed("TRAINING_SEARCH_ITERATIONS")
                    .unwrap_or(defaults.search_iterations),
                cv_folds: parsed("TRAINING_CV_FOLDS").unwrap_or(defaults.cv_folds),
                seed: parsed("TRAINING_SEED"),
            },
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
