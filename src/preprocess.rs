use crate::encoder::{LabelEncoder, LabelEncoding};
use crate::error::{ExperimentError, Result};
use crate::loader::Dataset;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::Serialize;
use tracing::info;

pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub nulls: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub features: Vec<f64>,
    pub code: usize,
}

/// What preprocessing saw in the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    /// `(label, rows)` in code order.
    pub class_counts: Vec<(String, usize)>,
    pub preview: Vec<PreviewRow>,
}

/// The numeric table both estimators train on.
///
/// `targets` holds the label codes as floats: the classifier reads them as
/// class indices, the regressor as a continuous response.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    feature_names: Vec<String>,
    label_name: String,
    features: Array2<f64>,
    targets: Array1<f64>,
    encoding: LabelEncoding,
}

impl EncodedDataset {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn targets(&self) -> ArrayView1<'_, f64> {
        self.targets.view()
    }

    pub fn encoding(&self) -> &LabelEncoding {
        &self.encoding
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Verifies there are no missing cells, then encodes the label column.
///
/// # Errors
///
/// `DataQuality` naming every column with missing values and the first
/// offending line. Nothing is imputed.
pub fn preprocess(dataset: &Dataset) -> Result<(EncodedDataset, DatasetSummary)> {
    let null_counts = dataset.null_counts();
    let dirty: Vec<String> = null_counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(name, n)| format!("{} ({} missing)", name, n))
        .collect();
    if !dirty.is_empty() {
        let first_line = dataset
            .rows()
            .iter()
            .find(|row| row.label.is_none() || row.features.iter().any(Option::is_none))
            .map(|row| row.line)
            .unwrap_or_default();
        return Err(ExperimentError::DataQuality(format!(
            "missing values in {}; first at line {}",
            dirty.join(", "),
            first_line
        )));
    }

    let schema = dataset.schema();
    let n_features = schema.feature_names().len();
    let mut features = Array2::<f64>::zeros((dataset.len(), n_features));
    let mut labels = Vec::with_capacity(dataset.len());

    for (i, row) in dataset.rows().iter().enumerate() {
        for (j, value) in row.features.iter().enumerate() {
            features[[i, j]] = value.ok_or_else(|| {
                ExperimentError::DataQuality(format!("line {} column {} is missing", row.line, j))
            })?;
        }
        let label = row.label.as_deref().ok_or_else(|| {
            ExperimentError::DataQuality(format!("line {} has no label", row.line))
        })?;
        labels.push(label);
    }

    let (codes, encoding) = LabelEncoder::fit_transform(&labels[..])?;
    let targets: Array1<f64> = codes.iter().map(|&c| c as f64).collect();

    let mut class_counts: Vec<(String, usize)> =
        encoding.classes().iter().map(|c| (c.clone(), 0)).collect();
    for &code in &codes {
        class_counts[code].1 += 1;
    }

    let preview = features
        .rows()
        .into_iter()
        .zip(codes.iter())
        .take(PREVIEW_ROWS)
        .map(|(row, &code)| PreviewRow { features: row.to_vec(), code })
        .collect();

    let summary = DatasetSummary {
        rows: dataset.len(),
        columns: null_counts
            .into_iter()
            .map(|(name, nulls)| ColumnSummary { name, nulls })
            .collect(),
        class_counts,
        preview,
    };

    info!(rows = summary.rows, classes = encoding.len(), "labels encoded");

    let encoded = EncodedDataset {
        feature_names: schema.feature_names().to_vec(),
        label_name: schema.label_name().to_string(),
        features,
        targets,
        encoding,
    };
    Ok((encoded, summary))
}
