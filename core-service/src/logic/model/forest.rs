//! Random Forest - bootstrap-aggregated Gini decision trees
//!
//! Small, dependency-light classifier for the anchor RSSI feature space.
//! Trees are fitted on bootstrap samples and consider a random subset of
//! `sqrt(n_features)` columns per split. Prediction is a majority vote.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_N_ESTIMATORS};
use crate::logic::training::CancelToken;
use super::label::Room;

const N_CLASSES: usize = Room::COUNT;

type ClassCounts = [usize; N_CLASSES];

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for pluggable supervised classifiers
pub trait Classifier: Send + Sync {
    /// Predict the class index of one feature row
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize;

    /// Predict every row of a feature matrix
    fn predict(&self, x: ArrayView2<'_, f64>) -> Vec<usize> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("no samples to fit")]
    NoSamples,

    #[error("label {0} outside the class range")]
    InvalidLabel(usize),

    #[error("fit cancelled")]
    Cancelled,
}

// ============================================================================
// HYPERPARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Fit on the rows listed in `samples` (may repeat)
    fn fit<R: Rng + ?Sized>(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        samples: Vec<usize>,
        max_depth: usize,
        max_features: usize,
        rng: &mut R,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            max_depth,
            max_features,
            rng,
        };
        Self {
            root: builder.build(samples, 0),
        }
    }
}

impl Classifier for DecisionTree {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class } => return *class,
                Node::Split { feature, threshold, left, right } => {
                    node = if row[*feature] <= *threshold { left.as_ref() } else { right.as_ref() };
                }
            }
        }
    }
}

struct TreeBuilder<'a, 'y, 'r, R: ?Sized> {
    x: ArrayView2<'a, f64>,
    y: &'y [usize],
    max_depth: usize,
    max_features: usize,
    rng: &'r mut R,
}

impl<R: Rng + ?Sized> TreeBuilder<'_, '_, '_, R> {
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> Node {
        let counts = class_counts(self.y, &samples);
        let majority = majority(&counts);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if depth >= self.max_depth || samples.len() < 2 || is_pure {
            return Node::Leaf { class: majority };
        }

        let Some((feature, threshold)) = self.best_split(&samples, &counts) else {
            return Node::Leaf { class: majority };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&i| self.x[[i, feature]] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    /// Lowest weighted Gini split over a random feature subset.
    ///
    /// Features without any valid threshold do not count towards
    /// `max_features`, so a node only becomes a leaf when no column separates it.
    fn best_split(&mut self, samples: &[usize], parent: &ClassCounts) -> Option<(usize, f64)> {
        let n_features = self.x.ncols();
        let parent_impurity = gini(parent, samples.len());
        let order = sample(&mut *self.rng, n_features, n_features);

        let mut best: Option<(usize, f64, f64)> = None;
        let mut evaluated = 0;

        for feature in order.iter() {
            if evaluated >= self.max_features && best.is_some() {
                break;
            }

            let mut column: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (self.x[[i, feature]], self.y[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let total = column.len();
            let mut left: ClassCounts = [0; N_CLASSES];
            let mut right: ClassCounts = *parent;
            let mut has_threshold = false;

            for k in 0..total - 1 {
                let (value, class) = column[k];
                left[class] += 1;
                right[class] -= 1;

                let next = column[k + 1].0;
                if value == next {
                    continue;
                }
                has_threshold = true;

                let n_left = k + 1;
                let n_right = total - n_left;
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;

                let improves = impurity < parent_impurity - 1e-12;
                if improves && best.map_or(true, |(_, _, b)| impurity < b) {
                    best = Some((feature, (value + next) / 2.0, impurity));
                }
            }

            if has_threshold {
                evaluated += 1;
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}

fn class_counts(y: &[usize], samples: &[usize]) -> ClassCounts {
    let mut counts = [0; N_CLASSES];
    for &i in samples {
        counts[y[i]] += 1;
    }
    counts
}

/// Most frequent class; ties go to the lower index
fn majority(counts: &ClassCounts) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(counts: &ClassCounts, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

// ============================================================================
// RANDOM FOREST
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest. Checks `cancel` before every tree.
    pub fn fit<R: Rng + ?Sized>(
        x: ArrayView2<'_, f64>,
        y: &[usize],
        params: ForestParams,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Self, FitError> {
        let n_samples = x.nrows();
        if n_samples == 0 || y.len() != n_samples {
            return Err(FitError::NoSamples);
        }
        if let Some(&label) = y.iter().find(|&&label| label >= N_CLASSES) {
            return Err(FitError::InvalidLabel(label));
        }

        let n_features = x.ncols();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let n_estimators = params.n_estimators.max(1);
        let max_depth = params.max_depth.max(1);

        let mut trees = Vec::with_capacity(n_estimators);
        for _ in 0..n_estimators {
            if cancel.is_cancelled() {
                return Err(FitError::Cancelled);
            }
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            trees.push(DecisionTree::fit(x, y, bootstrap, max_depth, max_features, rng));
        }

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    pub fn params(&self) -> ForestParams {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut votes: ClassCounts = [0; N_CLASSES];
        for tree in &self.trees {
            votes[tree.predict_row(row)] += 1;
        }
        majority(&votes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two well separated clusters: class 0 near -60 on column 0, class 1 near -80
    fn clusters() -> (Array2<f64>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64;
            rows.extend_from_slice(&[-60.0 - jitter, -75.0 + jitter]);
            labels.push(0);
            rows.extend_from_slice(&[-80.0 - jitter, -62.0 + jitter]);
            labels.push(1);
        }
        (Array2::from_shape_vec((40, 2), rows).unwrap(), labels)
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[5, 5], 10), 0.5);
        assert_eq!(gini(&[10, 0], 10), 0.0);
        assert_eq!(gini(&[0, 0], 0), 0.0);
    }

    #[test]
    fn test_majority_tie_prefers_lower_index() {
        assert_eq!(majority(&[3, 3]), 0);
        assert_eq!(majority(&[1, 4]), 1);
    }

    #[test]
    fn test_forest_separates_clusters() {
        let (x, y) = clusters();
        let mut rng = StdRng::seed_from_u64(7);
        let forest = RandomForest::fit(x.view(), &y, ForestParams::default(), &mut rng, &CancelToken::new()).unwrap();

        assert_eq!(forest.n_trees(), 10);
        assert_eq!(forest.n_features(), 2);

        let predictions = forest.predict(x.view());
        assert_eq!(predictions, y);

        let unseen = array![[-61.0, -74.0], [-82.0, -60.0]];
        assert_eq!(forest.predict(unseen.view()), vec![0, 1]);
    }

    #[test]
    fn test_depth_one_is_a_stump() {
        let (x, y) = clusters();
        let mut rng = StdRng::seed_from_u64(1);
        let params = ForestParams { n_estimators: 1, max_depth: 1 };
        let forest = RandomForest::fit(x.view(), &y, params, &mut rng, &CancelToken::new()).unwrap();

        match &forest.trees[0].root {
            Node::Split { left, right, .. } => {
                assert!(matches!(**left, Node::Leaf { .. }));
                assert!(matches!(**right, Node::Leaf { .. }));
            }
            Node::Leaf { .. } => panic!("expected a split at the root"),
        }
    }

    #[test]
    fn test_fit_rejects_empty_and_bad_labels() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty = Array2::<f64>::zeros((0, 2));
        let err = RandomForest::fit(empty.view(), &[], ForestParams::default(), &mut rng, &CancelToken::new());
        assert_eq!(err.unwrap_err(), FitError::NoSamples);

        let x = Array2::<f64>::zeros((1, 2));
        let err = RandomForest::fit(x.view(), &[5], ForestParams::default(), &mut rng, &CancelToken::new());
        assert_eq!(err.unwrap_err(), FitError::InvalidLabel(5));
    }

    #[test]
    fn test_fit_observes_cancellation() {
        let (x, y) = clusters();
        let mut rng = StdRng::seed_from_u64(3);
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = RandomForest::fit(x.view(), &y, ForestParams::default(), &mut rng, &cancel);
        assert_eq!(err.unwrap_err(), FitError::Cancelled);
    }

    #[test]
    fn test_forest_serializes() {
        let (x, y) = clusters();
        let mut rng = StdRng::seed_from_u64(11);
        let forest = RandomForest::fit(x.view(), &y, ForestParams { n_estimators: 3, max_depth: 4 }, &mut rng, &CancelToken::new()).unwrap();

        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(x.view()), forest.predict(x.view()));
    }
}
