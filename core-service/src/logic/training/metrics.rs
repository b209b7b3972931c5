//! Held-out validation metrics

use crate::logic::model::{Room, TrainingStats};

pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    ratio(correct, truth.len().min(predicted.len()))
}

/// Accuracy plus precision / recall of the positive class.
/// A zero denominator yields 0.0.
pub fn evaluate(truth: &[usize], predicted: &[usize]) -> TrainingStats {
    let positive = Room::POSITIVE.index();
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);

    for (&t, &p) in truth.iter().zip(predicted) {
        match (t == positive, p == positive) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    TrainingStats {
        accuracy: accuracy(truth, predicted),
        precision: ratio(tp, tp + fp),
        recall: ratio(tp, tp + fn_),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVING: usize = 0;
    const BED: usize = 1;

    #[test]
    fn test_evaluate_mixed() {
        let truth = [BED, BED, LIVING, LIVING, BED];
        let predicted = [BED, LIVING, BED, LIVING, BED];

        let stats = evaluate(&truth, &predicted);
        assert!((stats.accuracy - 0.6).abs() < 1e-9);
        assert!((stats.precision - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.recall - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_positive_predictions() {
        let stats = evaluate(&[LIVING, BED], &[LIVING, LIVING]);
        assert_eq!(stats.precision, 0.0);
        assert_eq!(stats.recall, 0.0);
        assert_eq!(stats.accuracy, 0.5);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(evaluate(&[], &[]), TrainingStats::default());
    }
}
