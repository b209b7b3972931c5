//! Train / validation partitioning

use rand::seq::SliceRandom;
use rand::Rng;

/// Number of held-out rows: `ceil(n * fraction)`, keeping at least one row
/// on each side when `n >= 2`.
pub fn test_size(n: usize, fraction: f64) -> usize {
    if n < 2 {
        return 0;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    ((n as f64 * fraction).ceil() as usize).clamp(1, n - 1)
}

/// Shuffle `0..n` and split into `(train, test)` index sets
pub fn holdout<R: Rng + ?Sized>(n: usize, fraction: f64, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let train = indices.split_off(test_size(n, fraction));
    (train, indices)
}

/// Contiguous k-fold partition of `indices` as `(train, validation)` pairs.
/// The first `n % k` folds take one extra row. Empty when fewer than two rows.
pub fn k_folds(indices: &[usize], k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let n = indices.len();
    if n < 2 {
        return Vec::new();
    }
    let k = k.clamp(2, n);

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let end = start + n / k + usize::from(fold < n % k);
        let validation = indices[start..end].to_vec();
        let train = indices[..start]
            .iter()
            .chain(&indices[end..])
            .copied()
            .collect();
        folds.push((train, validation));
        start = end;
    }
    folds
}
