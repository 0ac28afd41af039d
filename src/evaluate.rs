use crate::encoder::LabelEncoding;
use crate::error::{ExperimentError, Result};
use crate::estimator::{ClassifierModel, FittedModel, RegressorModel};
use dualfit_helpers::Float;
use linear_regression::r2_score;
use ndarray::{ArrayView1, ArrayView2};
use serde::Serialize;
use tracing::{info, warn};

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub class_index: usize,
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of test rows whose true class is this one.
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy plus a per-class breakdown.
///
/// `per_class` has one row for every class of the encoding, including classes
/// absent from the test set (their support is 0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub n_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    /// Coefficient of determination on the held-out rows.
    pub r2: f64,
    pub n_samples: usize,
}

pub fn accuracy(predicted: &[usize], actual: &[usize]) -> Result<f64> {
    check_lengths(predicted.len(), actual.len())?;
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(correct as f64 / predicted.len() as f64)
}

/// Per-class precision/recall/F1 for `n_classes` classes.
///
/// Labels in `predicted` or `actual` must be below `n_classes`.
pub fn class_metrics(predicted: &[usize], actual: &[usize], encoding: &LabelEncoding) -> Result<Vec<ClassMetrics>> {
    check_lengths(predicted.len(), actual.len())?;
    let n_classes = encoding.len();
    let mut true_positive = vec![0usize; n_classes];
    let mut predicted_count = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];

    for (&p, &a) in predicted.iter().zip(actual) {
        if p >= n_classes || a >= n_classes {
            return Err(ExperimentError::UnknownLabel(format!(
                "class index {} is outside the fitted range 0..{}",
                p.max(a),
                n_classes
            )));
        }
        predicted_count[p] += 1;
        support[a] += 1;
        if p == a {
            true_positive[p] += 1;
        }
    }

    (0..n_classes)
        .map(|k| -> Result<ClassMetrics> {
            let label = encoding.decode(k)?.to_string();
            let precision = safe_ratio(true_positive[k], predicted_count[k], "precision", &label);
            let recall = safe_ratio(true_positive[k], support[k], "recall", &label);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            Ok(ClassMetrics { class_index: k, label, precision, recall, f1, support: support[k] })
        })
        .collect()
}

/// Scores a trained classifier on the test rows.
pub fn evaluate_classifier(
    model: &ClassifierModel,
    x_test: ArrayView2<f64>,
    y_test: ArrayView1<f64>,
    encoding: &LabelEncoding,
) -> Result<ClassificationReport> {
    let predicted = model.predict(x_test)?.to_vec();
    let actual = class_indices(y_test)?;

    let accuracy = accuracy(&predicted, &actual)?;
    let per_class = class_metrics(&predicted, &actual, encoding)?;
    let macro_avg = average(&per_class, false);
    let weighted_avg = average(&per_class, true);

    info!(accuracy, samples = actual.len(), "classifier evaluated");
    Ok(ClassificationReport { accuracy, per_class, macro_avg, weighted_avg, n_samples: actual.len() })
}

/// Scores a trained regressor on the test rows with R².
pub fn evaluate_regressor(
    model: &RegressorModel,
    x_test: ArrayView2<f64>,
    y_test: ArrayView1<f64>,
) -> Result<RegressionReport> {
    let predicted = model.predict(x_test)?;
    check_lengths(predicted.len(), y_test.len())?;
    let r2 = r2_score(y_test, predicted.view())
        .ok_or_else(|| ExperimentError::DataQuality("cannot compute R² on an empty test set".into()))?;

    info!(r2, samples = y_test.len(), "regressor evaluated");
    Ok(RegressionReport { r2, n_samples: y_test.len() })
}

fn check_lengths(predicted: usize, actual: usize) -> Result<()> {
    if predicted != actual {
        return Err(ExperimentError::DataQuality(format!(
            "{} predictions for {} targets",
            predicted, actual
        )));
    }
    if predicted == 0 {
        return Err(ExperimentError::DataQuality("cannot evaluate on an empty test set".into()));
    }
    Ok(())
}

fn class_indices(y: ArrayView1<f64>) -> Result<Vec<usize>> {
    y.iter()
        .map(|v| {
            v.as_class_index()
                .ok_or_else(|| ExperimentError::UnknownLabel(format!("{} is not a class code", v)))
        })
        .collect()
}

/// `numerator / denominator`, or 0 with a warning when the denominator is 0.
fn safe_ratio(numerator: usize, denominator: usize, metric: &str, label: &str) -> f64 {
    if denominator == 0 {
        warn!(metric, label, "ill-defined metric set to 0.0");
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn average(per_class: &[ClassMetrics], weighted: bool) -> AverageMetrics {
    let support: usize = per_class.iter().map(|m| m.support).sum();
    let weight = |m: &ClassMetrics| if weighted { m.support as f64 } else { 1.0 };
    let total: f64 = per_class.iter().map(weight).sum();
    let mean = |value: fn(&ClassMetrics) -> f64| {
        if total == 0.0 {
            0.0
        } else {
            per_class.iter().map(|m| weight(m) * value(m)).sum::<f64>() / total
        }
    };
    AverageMetrics {
        precision: mean(|m| m.precision),
        recall: mean(|m| m.recall),
        f1: mean(|m| m.f1),
        support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{ClassifierEstimator, Estimator, RegressorEstimator};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn encoding(labels: &[&str]) -> LabelEncoding {
        LabelEncoding::fit(labels).unwrap()
    }

    #[test]
    fn test_accuracy() {
        assert_abs_diff_eq!(accuracy(&[0, 1, 2, 1], &[0, 1, 1, 1]).unwrap(), 0.75);
        assert!(accuracy(&[], &[]).is_err());
        assert!(accuracy(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_class_metrics() {
        let enc = encoding(&["a", "b", "c"]);
        let predicted = [0, 0, 1, 1, 2, 2];
        let actual = [0, 1, 1, 1, 2, 0];
        let metrics = class_metrics(&predicted, &actual, &enc).unwrap();

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[0].label, "a");
        assert_abs_diff_eq!(metrics[0].precision, 0.5);
        assert_abs_diff_eq!(metrics[0].recall, 0.5);
        assert_abs_diff_eq!(metrics[1].precision, 1.0);
        assert_abs_diff_eq!(metrics[1].recall, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics[1].f1, 0.8, epsilon = 1e-12);
        assert_eq!(metrics[1].support, 3);
        assert_eq!(metrics[2].support, 1);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let enc = encoding(&["a", "b", "c"]);
        // class c never appears and is never predicted
        let metrics = class_metrics(&[0, 1], &[0, 0], &enc).unwrap();
        assert_eq!(metrics[1].precision, 0.0);
        assert_eq!(metrics[1].recall, 0.0);
        assert_eq!(metrics[2].support, 0);
        assert_eq!(metrics[2].f1, 0.0);
    }

    #[test]
    fn test_averages() {
        let per_class = vec![
            ClassMetrics { class_index: 0, label: "a".into(), precision: 1.0, recall: 1.0, f1: 1.0, support: 3 },
            ClassMetrics { class_index: 1, label: "b".into(), precision: 0.0, recall: 0.0, f1: 0.0, support: 1 },
        ];
        let macro_avg = average(&per_class, false);
        let weighted = average(&per_class, true);
        assert_abs_diff_eq!(macro_avg.f1, 0.5);
        assert_abs_diff_eq!(weighted.f1, 0.75);
        assert_eq!(weighted.support, 4);
    }

    #[test]
    fn test_out_of_range_class() {
        let enc = encoding(&["a", "b"]);
        assert!(matches!(
            class_metrics(&[0, 2], &[0, 1], &enc),
            Err(ExperimentError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_evaluate_models() {
        let x = array![[0.0, 0.1], [0.2, 0.0], [5.0, 5.1], [5.2, 4.9], [9.9, 0.2], [10.1, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let enc = encoding(&["p", "q", "r"]);

        let classifier = ClassifierEstimator::default().fit(x.view(), y.view()).unwrap();
        let report = evaluate_classifier(&classifier, x.view(), y.view(), &enc).unwrap();
        assert_eq!(report.per_class.len(), 3);
        assert_eq!(report.n_samples, 6);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert_eq!(report.weighted_avg.support, 6);

        let regressor = RegressorEstimator::new().fit(x.view(), y.view()).unwrap();
        let report = evaluate_regressor(&regressor, x.view(), y.view()).unwrap();
        assert!(report.r2 <= 1.0);
    }
}
