//! Model fitting for one training run
//!
//! Filters the dataset to the requested device, holds out a validation
//! partition, fits a forest (fixed defaults or randomized search with k-fold
//! cross-validation) and scores it on the held-out rows.

use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{DEFAULT_CV_FOLDS, DEFAULT_HOLDOUT_FRACTION, DEFAULT_SEARCH_ITERATIONS};
use crate::logic::dataset::TrainingDataset;
use crate::logic::model::{Classifier, ForestParams, RandomForest, Room, TrainedModel};
use super::cancel::CancelToken;
use super::coordinator::TrainingRequest;
use super::{metrics, split, TrainingError};

/// Search space bounds (half-open)
const N_ESTIMATORS_RANGE: std::ops::Range<usize> = 50..500;
const MAX_DEPTH_RANGE: std::ops::Range<usize> = 1..20;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub holdout_fraction: f64,
    pub search_iterations: usize,
    pub cv_folds: usize,
    /// Fixed seed for reproducible runs; entropy otherwise
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
            search_iterations: DEFAULT_SEARCH_ITERATIONS,
            cv_folds: DEFAULT_CV_FOLDS,
            seed: None,
        }
    }
}

/// Produces a model from a dataset snapshot. Runs on a blocking worker.
pub trait ModelFitter: Send + Sync {
    fn fit(
        &self,
        dataset: &TrainingDataset,
        request: &TrainingRequest,
        cancel: &CancelToken,
    ) -> Result<TrainedModel, TrainingError>;
}

pub struct ForestFitter {
    config: TrainingConfig,
}

impl ForestFitter {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Randomized search; best mean k-fold accuracy wins, first on ties
    fn search<R: Rng>(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<ForestParams, TrainingError> {
        let indices: Vec<usize> = (0..y.len()).collect();
        let folds = split::k_folds(&indices, self.config.cv_folds);
        if folds.is_empty() {
            return Ok(ForestParams::default());
        }

        let mut best: Option<(ForestParams, f64)> = None;
        for _ in 0..self.config.search_iterations.max(1) {
            let params = ForestParams {
                n_estimators: rng.gen_range(N_ESTIMATORS_RANGE),
                max_depth: rng.gen_range(MAX_DEPTH_RANGE),
            };

            let mut total = 0.0;
            for (train, validation) in &folds {
                let forest = RandomForest::fit(
                    x.select(Axis(0), train).view(),
                    &pick(y, train),
                    params,
                    rng,
                    cancel,
                )?;
                let predicted = forest.predict(x.select(Axis(0), validation).view());
                total += metrics::accuracy(&pick(y, validation), &predicted);
            }
            let score = total / folds.len() as f64;
            log::debug!(
                "Search trial n_estimators={} max_depth={} cv_accuracy={:.3}",
                params.n_estimators,
                params.max_depth,
                score
            );

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((params, score));
            }
        }

        let (params, score) = best.unwrap_or((ForestParams::default(), 0.0));
        log::info!(
            "Best hyperparameters: n_estimators={} max_depth={} (cv accuracy {:.3})",
            params.n_estimators,
            params.max_depth,
            score
        );
        Ok(params)
    }
}

impl Default for ForestFitter {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl ModelFitter for ForestFitter {
    fn fit(
        &self,
        dataset: &TrainingDataset,
        request: &TrainingRequest,
        cancel: &CancelToken,
    ) -> Result<TrainedModel, TrainingError> {
        let device_id = request.device_id.as_str();
        let rows: Vec<_> = dataset.for_device(device_id).collect();
        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset(device_id.to_string()));
        }

        let y: Vec<usize> = rows.iter().map(|row| row.room.index()).collect();
        if Room::ALL.iter().any(|room| !y.contains(&room.index())) {
            return Err(TrainingError::SingleClassDataset(device_id.to_string()));
        }

        let width = dataset.anchors().len();
        let flat: Vec<f64> = rows.iter().flat_map(|row| row.features.iter().copied()).collect();
        let x = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|e| TrainingError::Worker(e.to_string()))?;

        let mut rng = self.rng();
        let (train, test) = split::holdout(rows.len(), self.config.holdout_fraction, &mut rng);
        let x_train = x.select(Axis(0), &train);
        let y_train = pick(&y, &train);

        let params = if request.optimize {
            self.search(x_train.view(), &y_train, &mut rng, cancel)?
        } else {
            ForestParams::default()
        };

        let forest = RandomForest::fit(x_train.view(), &y_train, params, &mut rng, cancel)?;
        let predicted = forest.predict(x.select(Axis(0), &test).view());
        let stats = metrics::evaluate(&pick(&y, &test), &predicted);

        log::info!(
            "Fitted {} ({} train / {} test rows): accuracy {:.3}, precision {:.3}, recall {:.3}",
            device_id,
            train.len(),
            test.len(),
            stats.accuracy,
            stats.precision,
            stats.recall
        );

        Ok(TrainedModel::new(
            device_id,
            dataset.anchors(),
            forest,
            stats,
            rows.len(),
        ))
    }
}

fn pick(values: &[usize], indices: &[usize]) -> Vec<usize> {
    indices.iter().map(|&i| values[i]).collect()
}
