//! K-fold cross-validation.
//!
//! Classifiers are scored on stratified folds so every fold sees every class
//! in roughly the dataset's proportions. Regressors use plain contiguous
//! folds. Both keep row order unless a shuffle seed is given.

use crate::error::{ExperimentError, Result};
use crate::estimator::{Estimator, EstimatorKind, FittedModel};
use dualfit_helpers::Float;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldStrategy {
    /// Consecutive blocks; the first `n % k` folds get one extra row.
    Contiguous,
    /// Rows grouped by class, then dealt round-robin over the folds.
    Stratified,
}

impl From<EstimatorKind> for FoldStrategy {
    fn from(kind: EstimatorKind) -> Self {
        match kind {
            EstimatorKind::Classifier => FoldStrategy::Stratified,
            EstimatorKind::Regressor => FoldStrategy::Contiguous,
        }
    }
}

/// One train/test assignment. Indices refer to rows of the scored data.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct KFold {
    k: usize,
    strategy: FoldStrategy,
    shuffle_seed: Option<u64>,
}

impl KFold {
    pub fn new(k: usize, strategy: FoldStrategy) -> Self {
        Self { k, strategy, shuffle_seed: None }
    }

    /// Shuffles the rows with `seed` before they are assigned to folds.
    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Builds `k` folds over `y`.
    ///
    /// Every row lands in exactly one test fold and no test fold is empty.
    pub fn folds(&self, y: ArrayView1<f64>) -> Result<Vec<Fold>> {
        let n = y.len();
        if self.k < 2 {
            return Err(ExperimentError::InvalidFoldCount {
                folds: self.k,
                reason: "at least 2 folds are required".into(),
            });
        }
        if self.k > n {
            return Err(ExperimentError::InvalidFoldCount {
                folds: self.k,
                reason: format!("cannot make more folds than the {} available rows", n),
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
            order.shuffle(&mut rng);
        }

        let mut assignment = vec![0usize; n];
        match self.strategy {
            FoldStrategy::Contiguous => {
                let (base, extra) = (n / self.k, n % self.k);
                let mut position = 0;
                for fold in 0..self.k {
                    let size = base + usize::from(fold < extra);
                    for &row in &order[position..position + size] {
                        assignment[row] = fold;
                    }
                    position += size;
                }
            }
            FoldStrategy::Stratified => {
                let codes = y
                    .iter()
                    .map(|v| {
                        v.as_class_index().ok_or_else(|| {
                            ExperimentError::UnknownLabel(format!("{} is not a class code", v))
                        })
                    })
                    .collect::<Result<Vec<usize>>>()?;
                self.warn_on_small_classes(&codes);
                order.sort_by_key(|&row| codes[row]);
                for (position, &row) in order.iter().enumerate() {
                    assignment[row] = position % self.k;
                }
            }
        }

        Ok((0..self.k)
            .map(|index| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    order.iter().copied().partition(|&row| assignment[row] == index);
                Fold { index, train, test }
            })
            .collect())
    }

    fn warn_on_small_classes(&self, codes: &[usize]) {
        let n_classes = codes.iter().max().map_or(0, |&max| max + 1);
        let mut counts = vec![0usize; n_classes];
        for &code in codes {
            counts[code] += 1;
        }
        if let Some(&smallest) = counts.iter().filter(|&&c| c > 0).min() {
            if smallest < self.k {
                warn!(smallest, folds = self.k, "least populated class has fewer members than folds");
            }
        }
    }
}

/// Scores `estimator` with k-fold cross-validation on `(x, y)`.
///
/// Each fold fits a fresh model from the same configuration. Returns one
/// score per fold, in fold order: accuracy for the classifier, R² for the
/// regressor.
pub fn cross_validate<E: Estimator>(
    estimator: &E,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    k: usize,
    shuffle_seed: Option<u64>,
) -> Result<Vec<f64>> {
    if x.nrows() != y.len() {
        return Err(ExperimentError::DataQuality(format!(
            "{} feature rows for {} targets",
            x.nrows(),
            y.len()
        )));
    }
    let kind = estimator.kind();
    let folds = KFold::new(k, FoldStrategy::from(kind)).with_shuffle(shuffle_seed).folds(y)?;

    folds
        .iter()
        .map(|fold| -> Result<f64> {
            let (x_train, y_train) = (x.select(Axis(0), &fold.train), y.select(Axis(0), &fold.train));
            let (x_test, y_test) = (x.select(Axis(0), &fold.test), y.select(Axis(0), &fold.test));
            let model = estimator.fit(x_train.view(), y_train.view())?;
            let score = model.score(x_test.view(), y_test.view())?;
            debug!(estimator = %kind, fold = fold.index, train = fold.train.len(), test = fold.test.len(), score, "fold scored");
            Ok(score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{ClassifierEstimator, RegressorEstimator};
    use ndarray::{Array1, Array2};
    use std::collections::HashSet;

    fn check_partition(folds: &[Fold], n: usize) {
        let mut seen = HashSet::new();
        for fold in folds {
            assert!(!fold.test.is_empty());
            assert_eq!(fold.train.len() + fold.test.len(), n);
            for &row in &fold.test {
                assert!(seen.insert(row), "row {} in two test folds", row);
            }
        }
        assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_contiguous_sizes() {
        let y = Array1::<f64>::zeros(11);
        let folds = KFold::new(3, FoldStrategy::Contiguous).folds(y.view()).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
        assert_eq!(folds[0].test, vec![0, 1, 2, 3]);
        assert_eq!(folds[2].test, vec![8, 9, 10]);
        check_partition(&folds, 11);
    }

    #[test]
    fn test_stratified_balances_classes() {
        let y: Array1<f64> = (0..30).map(|i| (i / 10) as f64).collect();
        let folds = KFold::new(5, FoldStrategy::Stratified).folds(y.view()).unwrap();
        check_partition(&folds, 30);
        for fold in &folds {
            assert_eq!(fold.test.len(), 6);
            for class in 0..3 {
                let count = fold.test.iter().filter(|&&row| y[row] == class as f64).count();
                assert_eq!(count, 2);
            }
        }
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let y = Array1::<f64>::zeros(20);
        let a = KFold::new(4, FoldStrategy::Contiguous).with_shuffle(Some(3)).folds(y.view()).unwrap();
        let b = KFold::new(4, FoldStrategy::Contiguous).with_shuffle(Some(3)).folds(y.view()).unwrap();
        let plain = KFold::new(4, FoldStrategy::Contiguous).folds(y.view()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, plain);
        check_partition(&a, 20);
    }

    #[test]
    fn test_invalid_fold_counts() {
        let y = Array1::<f64>::zeros(4);
        for k in [0, 1, 5] {
            let result = KFold::new(k, FoldStrategy::Contiguous).folds(y.view());
            assert!(matches!(result, Err(ExperimentError::InvalidFoldCount { folds, .. }) if folds == k));
        }
    }

    #[test]
    fn test_cross_validate_both_estimators() {
        let mut x = Array2::<f64>::zeros((30, 2));
        let mut y = Array1::<f64>::zeros(30);
        for i in 0..30 {
            let class = i % 3;
            x[[i, 0]] = class as f64 * 5.0 + (i as f64 * 0.37).sin() * 0.3;
            x[[i, 1]] = class as f64 * 3.0 + (i as f64 * 0.71).cos() * 0.3;
            y[i] = class as f64;
        }

        let scores = cross_validate(&ClassifierEstimator::default(), x.view(), y.view(), 5, None).unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

        let scores = cross_validate(&RegressorEstimator::new(), x.view(), y.view(), 5, Some(42)).unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|s| *s <= 1.0));
    }

    #[test]
    fn test_cross_validate_rejects_too_many_folds() {
        let x = Array2::<f64>::zeros((3, 1));
        let y = Array1::<f64>::zeros(3);
        let result = cross_validate(&RegressorEstimator::new(), x.view(), y.view(), 4, None);
        assert!(matches!(result, Err(ExperimentError::InvalidFoldCount { folds: 4, .. })));
    }
}
