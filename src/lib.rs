//! Train a linear support vector classifier and a linear regressor on the
//! same labelled table, then compare them on a held-out split and with k-fold
//! cross-validation.
//!
//! ```no_run
//! use dualfit::{ExperimentConfig, ExperimentRunner};
//!
//! let mut runner = ExperimentRunner::new(ExperimentConfig::new("data/iris.data"));
//! let report = runner.run()?;
//! println!("accuracy: {:.3}", report.classification.accuracy);
//! # Ok::<(), dualfit::ExperimentError>(())
//! ```

pub mod config;
pub mod cross_validation;
pub mod encoder;
pub mod error;
pub mod estimator;
pub mod evaluate;
pub mod loader;
pub mod preprocess;
pub mod report;
pub mod runner;
pub mod split;

pub use config::{ClassifierConfig, ExperimentConfig};
pub use cross_validation::{cross_validate, FoldStrategy, KFold};
pub use encoder::{LabelEncoder, LabelEncoding};
pub use error::{ExperimentError, Result};
pub use estimator::{ClassifierEstimator, Estimator, EstimatorKind, FittedModel, RegressorEstimator};
pub use evaluate::{evaluate_classifier, evaluate_regressor, ClassificationReport, RegressionReport};
pub use loader::{Dataset, DatasetLoader, Schema};
pub use preprocess::{DatasetSummary, EncodedDataset};
pub use report::{CrossValSummary, ExperimentReport};
pub use runner::{ExperimentRunner, ExperimentState};
pub use split::Split;
