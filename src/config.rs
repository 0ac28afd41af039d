use crate::error::{ExperimentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Column names of the iris file, label last.
pub const DEFAULT_SCHEMA: [&str; 5] =
    ["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm", "Species"];

/// Settings of one experiment run.
///
/// Every field except `dataset_path` has a default, so a TOML file only needs
/// the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Delimited input file without a header row.
    pub dataset_path: PathBuf,
    /// Column names; the last one is the label.
    pub schema: Vec<String>,
    /// Field separator, must be a single ASCII character.
    pub delimiter: char,
    /// Fraction of rows held out for testing, in `(0, 1)`.
    pub test_ratio: f64,
    /// Seed of the train/test permutation.
    pub split_seed: u64,
    /// Number of cross-validation folds, at least 2.
    pub cv_folds: usize,
    /// Shuffle rows before assigning folds.
    pub cv_shuffle: bool,
    /// Seed for the fold shuffle; falls back to `split_seed`.
    pub cv_seed: Option<u64>,
    /// Hyperparameters of the support vector classifier.
    pub classifier: ClassifierConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::new(),
            schema: DEFAULT_SCHEMA.iter().map(|s| s.to_string()).collect(),
            delimiter: ',',
            test_ratio: 0.2,
            split_seed: 42,
            cv_folds: 5,
            cv_shuffle: false,
            cv_seed: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

/// Linear SVM hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub c: f64,
    pub tol: f64,
    pub max_passes: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { c: 1.0, tol: 1e-3, max_passes: 5, max_iter: 1000, seed: 42 }
    }
}

impl ExperimentConfig {
    /// Default settings for the given dataset.
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self { dataset_path: dataset_path.into(), ..Self::default() }
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_cv_shuffle(mut self, shuffle: bool) -> Self {
        self.cv_shuffle = shuffle;
        self
    }

    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ExperimentError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// A relative `dataset_path` inside the file is resolved against the
    /// file's own directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ExperimentError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&text)?;
        if config.dataset_path.is_relative() && !config.dataset_path.as_os_str().is_empty() {
            if let Some(dir) = path.parent() {
                config.dataset_path = dir.join(&config.dataset_path);
            }
        }
        Ok(config)
    }

    /// Seed used for the fold shuffle.
    pub fn effective_cv_seed(&self) -> u64 {
        self.cv_seed.unwrap_or(self.split_seed)
    }

    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ExperimentError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))
        }
    }

    /// Checks every option that can be checked without reading the data.
    pub fn validate(&self) -> Result<()> {
        if self.dataset_path.as_os_str().is_empty() {
            return Err(ExperimentError::Config("dataset_path is required".into()));
        }
        if self.schema.len() < 2 {
            return Err(ExperimentError::Config(format!(
                "schema needs at least one feature and one label column, got {}",
                self.schema.len()
            )));
        }
        self.delimiter_byte()?;
        check_test_ratio(self.test_ratio)?;
        if self.cv_folds < 2 {
            return Err(ExperimentError::InvalidFoldCount {
                folds: self.cv_folds,
                reason: "at least 2 folds are required".into(),
            });
        }
        Ok(())
    }
}

/// A test ratio must lie strictly between 0 and 1.
pub(crate) fn check_test_ratio(ratio: f64) -> Result<()> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(ExperimentError::InvalidRatio { ratio, reason: "must be in (0, 1)".into() })
    }
}
