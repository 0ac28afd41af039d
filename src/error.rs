//! Error taxonomy of an experiment run.
//!
//! Every error is fatal to the run that raised it; nothing here is retried.

use crate::runner::ExperimentState;
use linear_regression::LinearRegressionError;
use linear_svm::SvmError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExperimentError>;

#[derive(Error, Debug)]
pub enum ExperimentError {
    /// The input file is missing, unreadable or structurally malformed.
    #[error("Cannot load dataset {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// The input was read but its contents cannot be used as-is.
    #[error("Data quality error: {0}")]
    DataQuality(String),

    #[error("Invalid test ratio {ratio}: {reason}")]
    InvalidRatio { ratio: f64, reason: String },

    #[error("Invalid fold count {folds}: {reason}")]
    InvalidFoldCount { folds: usize, reason: String },

    #[error("Cannot {operation} while the experiment is {state}")]
    InvalidState { operation: &'static str, state: ExperimentState },

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Classifier error: {0}")]
    Classifier(#[from] SvmError),

    #[error("Regressor error: {0}")]
    Regressor(#[from] LinearRegressionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExperimentError {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ExperimentError::DataLoad { path: path.into(), reason: reason.to_string() }
    }
}
