use crate::error::{ExperimentError, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cell values treated as missing. Matching is case-insensitive.
const MISSING_TOKENS: [&str; 6] = ["", "na", "nan", "null", "none", "?"];

/// Ordered column names; the last column is the label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        if columns.len() < 2 {
            return Err(ExperimentError::Config(format!(
                "schema needs at least one feature and one label column, got {}",
                columns.len()
            )));
        }
        Ok(Self { columns: columns.iter().map(|c| c.as_ref().to_string()).collect() })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.columns[..self.columns.len() - 1]
    }

    pub fn label_name(&self) -> &str {
        &self.columns[self.columns.len() - 1]
    }
}

/// Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub features: Vec<Option<f64>>,
    pub label: Option<String>,
}

/// The table exactly as read, before any cleaning or encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    source: PathBuf,
    schema: Schema,
    rows: Vec<RawRow>,
}

impl Dataset {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of missing cells per column, in schema order.
    pub fn null_counts(&self) -> Vec<(String, usize)> {
        let n_features = self.schema.feature_names().len();
        let mut counts = vec![0usize; self.schema.len()];
        for row in &self.rows {
            for (i, value) in row.features.iter().enumerate() {
                if value.is_none() {
                    counts[i] += 1;
                }
            }
            if row.label.is_none() {
                counts[n_features] += 1;
            }
        }
        self.schema.columns().iter().cloned().zip(counts).collect()
    }
}

/// Reads headerless delimited files against a fixed schema.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: u8,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads `path`, checking every row against `schema`.
    ///
    /// # Errors
    ///
    /// `DataLoad` if the file cannot be opened or read, is empty, or a row
    /// has the wrong number of fields. `DataQuality` if a feature cell holds
    /// something that is neither a number nor a missing marker.
    pub fn load(&self, path: &Path, schema: &Schema) -> Result<Dataset> {
        let file = File::open(path).map_err(|e| ExperimentError::data_load(path, e))?;
        self.load_from_reader(file, path, schema)
    }

    /// Same as [`DatasetLoader::load`] for an already opened source.
    /// `origin` is only used in error messages.
    pub fn load_from_reader<R: Read>(&self, reader: R, origin: &Path, schema: &Schema) -> Result<Dataset> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let n_features = schema.feature_names().len();
        let mut rows = Vec::new();

        for (index, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|e| ExperimentError::data_load(origin, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(index as u64 + 1);
            if record.iter().all(str::is_empty) {
                continue;
            }

            if record.len() != schema.len() {
                return Err(ExperimentError::data_load(
                    origin,
                    format!(
                        "line {} has {} fields, expected {} ({})",
                        line,
                        record.len(),
                        schema.len(),
                        schema.columns().join(", ")
                    ),
                ));
            }

            let mut features = Vec::with_capacity(n_features);
            for (column, raw) in schema.feature_names().iter().zip(record.iter()) {
                features.push(parse_feature(raw, line, column)?);
            }
            let label = record
                .get(n_features)
                .filter(|raw| !is_missing(raw))
                .map(str::to_string);

            rows.push(RawRow { line, features, label });
        }

        if rows.is_empty() {
            return Err(ExperimentError::data_load(origin, "file contains no rows"));
        }

        info!(path = %origin.display(), rows = rows.len(), columns = schema.len(), "dataset loaded");
        debug!(first = ?rows.first(), "first row");

        Ok(Dataset { source: origin.to_path_buf(), schema: schema.clone(), rows })
    }
}

fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.iter().any(|token| raw.eq_ignore_ascii_case(token))
}

fn parse_feature(raw: &str, line: u64, column: &str) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ExperimentError::DataQuality(format!(
            "line {}, column {}: {:?} is not a number",
            line, column, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SCHEMA;

    fn iris_schema() -> Schema {
        Schema::new(&DEFAULT_SCHEMA).unwrap()
    }

    fn load_str(text: &str) -> Result<Dataset> {
        DatasetLoader::new().load_from_reader(text.as_bytes(), Path::new("memory"), &iris_schema())
    }

    #[test]
    fn test_load_rows() {
        let data = load_str(
            "5.1,3.5,1.4,0.2,Iris-setosa\n7.0,3.2,4.7,1.4,Iris-versicolor\n\n",
        )
        .unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[0].features, vec![Some(5.1), Some(3.5), Some(1.4), Some(0.2)]);
        assert_eq!(data.rows()[1].label.as_deref(), Some("Iris-versicolor"));
        assert_eq!(data.rows()[1].line, 2);
        assert!(data.null_counts().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_whitespace_only_line_is_skipped() {
        let data = load_str("5.1,3.5,1.4,0.2,a\n   \n4.9,3.0,1.4,0.2,b\n\t\n").unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.rows()[1].label.as_deref(), Some("b"));
        assert_eq!(data.rows()[1].line, 3);
    }

    #[test]
    fn test_short_row_is_load_error() {
        let result = load_str("5.1,3.5,1.4,0.2,Iris-setosa\n4.9,3.0,1.4,Iris-setosa\n");
        match result {
            Err(ExperimentError::DataLoad { reason, .. }) => {
                assert!(reason.contains("line 2 has 4 fields, expected 5"), "{}", reason)
            }
            other => panic!("expected DataLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_cells_are_kept() {
        let data = load_str("5.1,,1.4,0.2,Iris-setosa\n4.9,3.0,NA,0.2,?\n").unwrap();
        let nulls = data.null_counts();
        assert_eq!(nulls[0], ("SepalLengthCm".to_string(), 0));
        assert_eq!(nulls[1], ("SepalWidthCm".to_string(), 1));
        assert_eq!(nulls[2], ("PetalLengthCm".to_string(), 1));
        assert_eq!(nulls[4], ("Species".to_string(), 1));
    }

    #[test]
    fn test_non_numeric_feature() {
        let result = load_str("5.1,wide,1.4,0.2,Iris-setosa\n");
        match result {
            Err(ExperimentError::DataQuality(msg)) => {
                assert!(msg.contains("SepalWidthCm"));
                assert!(msg.contains("wide"));
            }
            other => panic!("expected DataQuality, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(load_str("\n\n"), Err(ExperimentError::DataLoad { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = DatasetLoader::new().load(Path::new("/nonexistent/iris.data"), &iris_schema());
        assert!(matches!(result, Err(ExperimentError::DataLoad { .. })));
    }

    #[test]
    fn test_custom_delimiter() {
        let data = DatasetLoader::new()
            .with_delimiter(b';')
            .load_from_reader("1;2;3;4;a\n".as_bytes(), Path::new("memory"), &iris_schema())
            .unwrap();
        assert_eq!(data.rows()[0].features[3], Some(4.0));
    }

    #[test]
    fn test_schema_too_short() {
        assert!(Schema::new(&["only"]).is_err());
        let schema = Schema::new(&["a", "b", "label"]).unwrap();
        assert_eq!(schema.feature_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(schema.label_name(), "label");
    }
}
