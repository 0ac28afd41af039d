use crate::estimator::EstimatorKind;
use crate::evaluate::{ClassificationReport, RegressionReport};
use crate::preprocess::DatasetSummary;
use serde::Serialize;

/// Cross-validation scores of one estimator with their mean and population
/// standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValSummary {
    pub estimator: EstimatorKind,
    pub metric: &'static str,
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CrossValSummary {
    pub fn from_scores(estimator: EstimatorKind, scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let (mean, std) = if scores.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = scores.iter().sum::<f64>() / n;
            let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            (mean, variance.sqrt())
        };
        Self { estimator, metric: estimator.metric_name(), scores, mean, std }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_ratio: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub dataset: DatasetSummary,
    pub classes: Vec<String>,
    pub split: SplitSummary,
    pub classifier_name: &'static str,
    pub regressor_name: &'static str,
    pub classification: ClassificationReport,
    pub regression: RegressionReport,
    pub cross_validation: Vec<CrossValSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_population_std() {
        let summary = CrossValSummary::from_scores(EstimatorKind::Classifier, vec![0.9, 1.0, 0.8, 1.0, 0.8]);
        assert_eq!(summary.metric, "accuracy");
        assert_abs_diff_eq!(summary.mean, 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.std, 0.008f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_scores() {
        let summary = CrossValSummary::from_scores(EstimatorKind::Regressor, Vec::new());
        assert_eq!(summary.metric, "r2");
        assert_eq!((summary.mean, summary.std), (0.0, 0.0));
    }
}
