//! The two estimators of an experiment.
//!
//! [`Estimator`] is sealed: the classifier and the regressor are the only
//! implementations. An estimator is an unfitted configuration and acts as its
//! own factory; every call to [`Estimator::fit`] returns a fresh, immutable
//! [`FittedModel`].

use crate::config::ClassifierConfig;
use crate::error::Result;
use linear_regression::{FittedLinearRegression, LinearRegression};
use linear_svm::{FittedLinearSvc, LinearSvc};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::Serialize;
use std::fmt::{Display, Formatter};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ClassifierEstimator {}
    impl Sealed for super::RegressorEstimator {}
}

/// Which of the two model families an estimator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Classifier,
    Regressor,
}

impl EstimatorKind {
    /// Name of the metric returned by [`FittedModel::score`].
    pub fn metric_name(&self) -> &'static str {
        match self {
            EstimatorKind::Classifier => "accuracy",
            EstimatorKind::Regressor => "r2",
        }
    }
}

impl Display for EstimatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorKind::Classifier => write!(f, "classifier"),
            EstimatorKind::Regressor => write!(f, "regressor"),
        }
    }
}

/// A trainable model family.
pub trait Estimator: sealed::Sealed {
    type Model: FittedModel;

    fn kind(&self) -> EstimatorKind;

    /// Human-readable name, e.g. `"SVM (linear kernel)"`.
    fn name(&self) -> &'static str;

    /// Trains on `(x, y)` without touching `self`.
    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Self::Model>;
}

/// A trained model.
pub trait FittedModel {
    type Prediction;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<Self::Prediction>>;

    /// The model's natural score on `(x, y)`: accuracy or R².
    fn score(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64>;
}

/// Linear-kernel support vector classifier over the encoded label codes.
#[derive(Debug, Clone)]
pub struct ClassifierEstimator {
    svc: LinearSvc<f64>,
}

impl ClassifierEstimator {
    pub fn new(config: &ClassifierConfig) -> Self {
        let svc = LinearSvc::new()
            .with_c(config.c)
            .with_tol(config.tol)
            .with_max_passes(config.max_passes)
            .with_max_iter(config.max_iter)
            .with_seed(config.seed);
        Self { svc }
    }
}

impl Default for ClassifierEstimator {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

impl Estimator for ClassifierEstimator {
    type Model = ClassifierModel;

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Classifier
    }

    fn name(&self) -> &'static str {
        "SVM (linear kernel)"
    }

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<ClassifierModel> {
        Ok(ClassifierModel { inner: self.svc.fit(x, y)? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierModel {
    inner: FittedLinearSvc<f64>,
}

impl ClassifierModel {
    pub fn inner(&self) -> &FittedLinearSvc<f64> {
        &self.inner
    }
}

impl FittedModel for ClassifierModel {
    type Prediction = usize;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        Ok(self.inner.predict(x)?)
    }

    fn score(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64> {
        Ok(self.inner.score(x, y)?)
    }
}

/// Ordinary least squares that treats the label codes as a numeric response.
///
/// Regressing on category codes is statistically questionable; it is kept on
/// purpose so both model families see exactly the same targets.
#[derive(Debug, Clone, Default)]
pub struct RegressorEstimator {
    ols: LinearRegression,
}

impl RegressorEstimator {
    pub fn new() -> Self {
        Self { ols: LinearRegression::new() }
    }
}

impl Estimator for RegressorEstimator {
    type Model = RegressorModel;

    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Regressor
    }

    fn name(&self) -> &'static str {
        "Linear Regression"
    }

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<RegressorModel> {
        Ok(RegressorModel { inner: self.ols.fit(x, y)? })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressorModel {
    inner: FittedLinearRegression<f64>,
}

impl RegressorModel {
    pub fn inner(&self) -> &FittedLinearRegression<f64> {
        &self.inner
    }
}

impl FittedModel for RegressorModel {
    type Prediction = f64;

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.inner.predict(x)?)
    }

    fn score(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64> {
        Ok(self.inner.score(x, y)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExperimentError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn make_data() -> (ndarray::Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 1.0],
            [1.2, 0.8],
            [0.9, 1.1],
            [6.0, 6.0],
            [6.2, 5.8],
            [5.9, 6.1],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_same_targets_for_both_estimators() {
        let (x, y) = make_data();
        let classifier = ClassifierEstimator::default().fit(x.view(), y.view()).unwrap();
        let regressor = RegressorEstimator::new().fit(x.view(), y.view()).unwrap();

        assert_eq!(classifier.predict(x.view()).unwrap().to_vec(), vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(classifier.score(x.view(), y.view()).unwrap(), 1.0);

        let r2 = regressor.score(x.view(), y.view()).unwrap();
        assert!(r2 <= 1.0);
        assert!(r2 > 0.9);
        assert_eq!(regressor.predict(x.view()).unwrap().len(), 6);
    }

    #[test]
    fn test_fit_does_not_mutate_estimator() {
        let (x, y) = make_data();
        let estimator = RegressorEstimator::new();
        let first = estimator.fit(x.view(), y.view()).unwrap();
        let second = estimator.fit(x.view(), y.view()).unwrap();
        assert_eq!(first, second);
        assert_abs_diff_eq!(first.inner().intercept(), second.inner().intercept());
    }

    #[test]
    fn test_estimator_errors_are_wrapped() {
        let (x, _) = make_data();
        let fractional = array![0.0, 0.5, 0.0, 1.0, 1.0, 1.0];
        let result = ClassifierEstimator::default().fit(x.view(), fractional.view());
        assert!(matches!(result, Err(ExperimentError::Classifier(_))));

        let constant = array![[1.0], [1.0], [1.0]];
        let y = array![0.0, 1.0, 2.0];
        let result = RegressorEstimator::new().fit(constant.view(), y.view());
        assert!(matches!(result, Err(ExperimentError::Regressor(_))));
    }

    #[test]
    fn test_kind_and_metric() {
        assert_eq!(ClassifierEstimator::default().kind().metric_name(), "accuracy");
        assert_eq!(RegressorEstimator::new().kind().metric_name(), "r2");
        assert_eq!(EstimatorKind::Regressor.to_string(), "regressor");
        assert_eq!(serde_json::to_string(&EstimatorKind::Classifier).unwrap(), "\"classifier\"");
    }
}
