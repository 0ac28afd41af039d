use crate::config::check_test_ratio;
use crate::error::{ExperimentError, Result};
use crate::preprocess::EncodedDataset;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;

/// A disjoint train/test partition of an [`EncodedDataset`].
///
/// `train_indices` and `test_indices` refer to rows of the full dataset and
/// are in permutation order, matching the row order of the matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
    train_indices: Vec<usize>,
    test_indices: Vec<usize>,
}

impl Split {
    pub fn x_train(&self) -> ArrayView2<'_, f64> {
        self.x_train.view()
    }

    pub fn y_train(&self) -> ArrayView1<'_, f64> {
        self.y_train.view()
    }

    pub fn x_test(&self) -> ArrayView2<'_, f64> {
        self.x_test.view()
    }

    pub fn y_test(&self) -> ArrayView1<'_, f64> {
        self.y_test.view()
    }

    pub fn train_indices(&self) -> &[usize] {
        &self.train_indices
    }

    pub fn test_indices(&self) -> &[usize] {
        &self.test_indices
    }
}

/// Number of test rows for `n` rows: `ceil(n * test_ratio)`.
pub fn test_size(n: usize, test_ratio: f64) -> usize {
    (n as f64 * test_ratio).ceil() as usize
}

/// Shuffles `0..n` with a seeded Xoshiro256++ and cuts it in two.
///
/// Returns `(train, test)`. The test side is the head of the permutation.
pub fn partition_indices(n: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    check_test_ratio(test_ratio)?;
    let n_test = test_size(n, test_ratio);
    if n_test == 0 || n_test >= n {
        return Err(ExperimentError::InvalidRatio {
            ratio: test_ratio,
            reason: format!("{} rows cannot be split into non-empty train and test sets", n),
        });
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok((train, permutation))
}

/// Partitions the dataset deterministically for a given `(test_ratio, seed)`.
pub fn split(dataset: &EncodedDataset, test_ratio: f64, seed: u64) -> Result<Split> {
    let (train_indices, test_indices) = partition_indices(dataset.len(), test_ratio, seed)?;

    let x = dataset.features();
    let y = dataset.targets();
    let split = Split {
        x_train: x.select(Axis(0), &train_indices),
        y_train: y.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    };

    info!(train = split.train_indices.len(), test = split.test_indices.len(), seed, "dataset split");
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sizes_for_iris() {
        let (train, test) = partition_indices(150, 0.2, 42).unwrap();
        assert_eq!(train.len(), 120);
        assert_eq!(test.len(), 30);
    }

    #[test]
    fn test_test_size_rounds_up() {
        assert_eq!(test_size(10, 0.25), 3);
        assert_eq!(test_size(150, 0.2), 30);
    }

    #[test]
    fn test_deterministic() {
        for seed in [0, 42, 7777] {
            assert_eq!(partition_indices(97, 0.3, seed).unwrap(), partition_indices(97, 0.3, seed).unwrap());
        }
    }

    #[test]
    fn test_seed_changes_partition() {
        assert_ne!(partition_indices(100, 0.2, 1).unwrap(), partition_indices(100, 0.2, 2).unwrap());
    }

    #[test]
    fn test_disjoint_and_complete() {
        for (n, ratio) in [(2, 0.5), (10, 0.1), (33, 0.33), (150, 0.2), (151, 0.9)] {
            let (train, test) = partition_indices(n, ratio, 42).unwrap();
            assert_eq!(train.len() + test.len(), n);
            let train_set: HashSet<_> = train.iter().copied().collect();
            let test_set: HashSet<_> = test.iter().copied().collect();
            assert_eq!(train_set.len(), train.len());
            assert_eq!(test_set.len(), test.len());
            assert!(train_set.is_disjoint(&test_set));
            assert!(train_set.union(&test_set).all(|&i| i < n));
        }
    }

    #[test]
    fn test_invalid_ratio() {
        for ratio in [0.0, 1.0, -0.5, 2.0] {
            assert!(matches!(
                partition_indices(10, ratio, 42),
                Err(ExperimentError::InvalidRatio { .. })
            ));
        }
        // One row cannot give both sides a member.
        assert!(matches!(partition_indices(1, 0.5, 42), Err(ExperimentError::InvalidRatio { .. })));
    }
}
