//! The experiment lifecycle.
//!
//! [`ExperimentRunner`] owns every intermediate artefact and only lets each
//! stage run from the state its predecessor leaves behind:
//!
//! ```text
//! Uninitialized -> Loaded -> Preprocessed -> Split -> Trained -> Evaluated -> CrossValidated
//! ```
//!
//! A call from the wrong state fails with [`ExperimentError::InvalidState`]
//! and leaves the runner untouched. A stage that fails for any other reason
//! also leaves the runner in the state it was in before the call.

use crate::config::ExperimentConfig;
use crate::cross_validation::cross_validate;
use crate::error::{ExperimentError, Result};
use crate::estimator::{ClassifierEstimator, ClassifierModel, Estimator, RegressorEstimator, RegressorModel};
use crate::evaluate::{evaluate_classifier, evaluate_regressor, ClassificationReport, RegressionReport};
use crate::loader::{Dataset, DatasetLoader, Schema};
use crate::preprocess::{preprocess, DatasetSummary, EncodedDataset};
use crate::report::{CrossValSummary, ExperimentReport, SplitSummary};
use crate::split::{split, Split};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentState {
    Uninitialized,
    Loaded,
    Preprocessed,
    Split,
    Trained,
    Evaluated,
    CrossValidated,
}

impl Display for ExperimentState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExperimentState::Uninitialized => "uninitialized",
            ExperimentState::Loaded => "loaded",
            ExperimentState::Preprocessed => "preprocessed",
            ExperimentState::Split => "split",
            ExperimentState::Trained => "trained",
            ExperimentState::Evaluated => "evaluated",
            ExperimentState::CrossValidated => "cross-validated",
        };
        write!(f, "{}", name)
    }
}

/// Runs one experiment: load, preprocess, split, train both estimators,
/// evaluate them on the held-out rows and cross-validate them.
#[derive(Debug)]
pub struct ExperimentRunner {
    config: ExperimentConfig,
    state: ExperimentState,
    classifier: ClassifierEstimator,
    regressor: RegressorEstimator,
    dataset: Option<Dataset>,
    encoded: Option<EncodedDataset>,
    summary: Option<DatasetSummary>,
    split: Option<Split>,
    classifier_model: Option<ClassifierModel>,
    regressor_model: Option<RegressorModel>,
    classification: Option<ClassificationReport>,
    regression: Option<RegressionReport>,
    cross_validation: Option<Vec<CrossValSummary>>,
}

impl ExperimentRunner {
    pub fn new(config: ExperimentConfig) -> Self {
        let classifier = ClassifierEstimator::new(&config.classifier);
        Self {
            config,
            state: ExperimentState::Uninitialized,
            classifier,
            regressor: RegressorEstimator::new(),
            dataset: None,
            encoded: None,
            summary: None,
            split: None,
            classifier_model: None,
            regressor_model: None,
            classification: None,
            regression: None,
            cross_validation: None,
        }
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// The table as read, from `Loaded` onwards.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Features and encoded targets, from `Preprocessed` onwards.
    pub fn encoded_dataset(&self) -> Option<&EncodedDataset> {
        self.encoded.as_ref()
    }

    pub fn summary(&self) -> Option<&DatasetSummary> {
        self.summary.as_ref()
    }

    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    pub fn classifier_model(&self) -> Option<&ClassifierModel> {
        self.classifier_model.as_ref()
    }

    pub fn regressor_model(&self) -> Option<&RegressorModel> {
        self.regressor_model.as_ref()
    }

    pub fn classification_report(&self) -> Option<&ClassificationReport> {
        self.classification.as_ref()
    }

    pub fn regression_report(&self) -> Option<&RegressionReport> {
        self.regression.as_ref()
    }

    pub fn cross_validation(&self) -> Option<&[CrossValSummary]> {
        self.cross_validation.as_deref()
    }

    /// Reads the configured dataset.
    pub fn load(&mut self) -> Result<()> {
        self.require("load", &[ExperimentState::Uninitialized])?;
        if self.config.dataset_path.as_os_str().is_empty() {
            return Err(ExperimentError::Config("dataset_path is required".into()));
        }
        let schema = Schema::new(&self.config.schema)?;
        let loader = DatasetLoader::new().with_delimiter(self.config.delimiter_byte()?);
        let dataset = loader.load(&self.config.dataset_path, &schema)?;

        self.dataset = Some(dataset);
        self.state = ExperimentState::Loaded;
        Ok(())
    }

    /// Rejects missing values and encodes the labels.
    pub fn preprocess(&mut self) -> Result<()> {
        self.require("preprocess", &[ExperimentState::Loaded])?;
        let dataset = self.dataset.as_ref().ok_or_else(|| self.invalid("preprocess"))?;
        let (encoded, summary) = preprocess(dataset)?;

        self.encoded = Some(encoded);
        self.summary = Some(summary);
        self.state = ExperimentState::Preprocessed;
        Ok(())
    }

    /// Splits the encoded rows into train and test sets.
    pub fn partition(&mut self) -> Result<()> {
        self.require("partition", &[ExperimentState::Preprocessed])?;
        let encoded = self.encoded.as_ref().ok_or_else(|| self.invalid("partition"))?;
        let split = split(encoded, self.config.test_ratio, self.config.split_seed)?;

        self.split = Some(split);
        self.state = ExperimentState::Split;
        Ok(())
    }

    /// Fits both estimators on the training rows.
    pub fn train(&mut self) -> Result<()> {
        self.require("train", &[ExperimentState::Split])?;
        let split = self.split.as_ref().ok_or_else(|| self.invalid("train"))?;
        let classifier = self.classifier.fit(split.x_train(), split.y_train())?;
        let regressor = self.regressor.fit(split.x_train(), split.y_train())?;
        info!(rows = split.x_train().nrows(), "estimators trained");

        self.classifier_model = Some(classifier);
        self.regressor_model = Some(regressor);
        self.state = ExperimentState::Trained;
        Ok(())
    }

    /// Scores both fitted models on the test rows.
    ///
    /// Can be repeated once the experiment is cross-validated.
    pub fn evaluate(&mut self) -> Result<()> {
        self.require("evaluate", &[ExperimentState::Trained, ExperimentState::CrossValidated])?;
        let missing = || self.invalid("evaluate");
        let split = self.split.as_ref().ok_or_else(missing)?;
        let encoded = self.encoded.as_ref().ok_or_else(missing)?;
        let classifier = self.classifier_model.as_ref().ok_or_else(missing)?;
        let regressor = self.regressor_model.as_ref().ok_or_else(missing)?;

        let classification = evaluate_classifier(classifier, split.x_test(), split.y_test(), encoded.encoding())?;
        let regression = evaluate_regressor(regressor, split.x_test(), split.y_test())?;

        self.classification = Some(classification);
        self.regression = Some(regression);
        if self.state == ExperimentState::Trained {
            self.state = ExperimentState::Evaluated;
        }
        Ok(())
    }

    /// K-fold cross-validation of both estimators on the full encoded data.
    pub fn cross_validate(&mut self) -> Result<()> {
        self.require("cross-validate", &[ExperimentState::Evaluated])?;
        let encoded = self.encoded.as_ref().ok_or_else(|| self.invalid("cross-validate"))?;
        let (x, y) = (encoded.features(), encoded.targets());
        let k = self.config.cv_folds;
        let shuffle_seed = self.config.cv_shuffle.then(|| self.config.effective_cv_seed());

        let classifier_scores = cross_validate(&self.classifier, x, y, k, shuffle_seed)?;
        let regressor_scores = cross_validate(&self.regressor, x, y, k, shuffle_seed)?;
        let summaries = vec![
            CrossValSummary::from_scores(self.classifier.kind(), classifier_scores),
            CrossValSummary::from_scores(self.regressor.kind(), regressor_scores),
        ];
        for summary in &summaries {
            info!(estimator = %summary.estimator, mean = summary.mean, std = summary.std, "cross-validation finished");
        }

        self.cross_validation = Some(summaries);
        self.state = ExperimentState::CrossValidated;
        Ok(())
    }

    /// Drops everything downstream of loading so the data can be processed
    /// again without rereading the file.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == ExperimentState::Uninitialized {
            return Err(self.invalid("reset"));
        }
        self.encoded = None;
        self.summary = None;
        self.split = None;
        self.classifier_model = None;
        self.regressor_model = None;
        self.classification = None;
        self.regression = None;
        self.cross_validation = None;
        self.state = ExperimentState::Loaded;
        Ok(())
    }

    /// Assembles the report of a cross-validated experiment.
    pub fn report(&self) -> Result<ExperimentReport> {
        self.require("report", &[ExperimentState::CrossValidated])?;
        let missing = || self.invalid("report");
        let encoded = self.encoded.as_ref().ok_or_else(missing)?;
        let split = self.split.as_ref().ok_or_else(missing)?;

        Ok(ExperimentReport {
            dataset: self.summary.clone().ok_or_else(missing)?,
            classes: encoded.encoding().classes().to_vec(),
            split: SplitSummary {
                train_rows: split.train_indices().len(),
                test_rows: split.test_indices().len(),
                test_ratio: self.config.test_ratio,
                seed: self.config.split_seed,
            },
            classifier_name: self.classifier.name(),
            regressor_name: self.regressor.name(),
            classification: self.classification.clone().ok_or_else(missing)?,
            regression: self.regression.clone().ok_or_else(missing)?,
            cross_validation: self.cross_validation.clone().ok_or_else(missing)?,
        })
    }

    /// Runs every stage in order and returns the report.
    pub fn run(&mut self) -> Result<ExperimentReport> {
        self.load()?;
        self.preprocess()?;
        self.partition()?;
        self.train()?;
        self.evaluate()?;
        self.cross_validate()?;
        self.report()
    }

    fn require(&self, operation: &'static str, allowed: &[ExperimentState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> ExperimentError {
        ExperimentError::InvalidState { operation, state: self.state }
    }
}
