//! Label encoding.
//!
//! Codes are assigned in sorted (lexicographic, byte-wise) order of the
//! distinct labels, so the mapping does not depend on row order.

use crate::error::{ExperimentError, Result};
use serde::Serialize;

/// Bijection between label strings and the codes `0..K`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEncoding {
    classes: Vec<String>,
}

impl LabelEncoding {
    /// Collects the distinct labels and sorts them.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() {
            return Err(ExperimentError::DataQuality("cannot encode an empty label column".into()));
        }
        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        Ok(Self { classes })
    }

    /// Distinct labels; the position of a label is its code.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| ExperimentError::UnknownLabel(format!("{:?} was not seen during fitting", label)))
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes.get(code).map(String::as_str).ok_or_else(|| {
            ExperimentError::UnknownLabel(format!(
                "code {} is outside the fitted range 0..{}",
                code,
                self.classes.len()
            ))
        })
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }
}

/// Stateless entry point mirroring the usual `fit_transform` shape.
pub struct LabelEncoder;

impl LabelEncoder {
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> Result<(Vec<usize>, LabelEncoding)> {
        let encoding = LabelEncoding::fit(labels)?;
        let codes = encoding.transform(labels)?;
        Ok((codes, encoding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_assignment() {
        let labels = ["Iris-virginica", "Iris-setosa", "Iris-versicolor", "Iris-setosa"];
        let (codes, encoding) = LabelEncoder::fit_transform(&labels).unwrap();
        assert_eq!(encoding.classes(), &["Iris-setosa", "Iris-versicolor", "Iris-virginica"]);
        assert_eq!(codes, vec![2, 0, 1, 0]);
    }

    #[test]
    fn test_independent_of_input_order() {
        let (_, a) = LabelEncoder::fit_transform(&["b", "a", "c"]).unwrap();
        let (_, b) = LabelEncoder::fit_transform(&["c", "c", "a", "b"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bijection() {
        let labels = ["x", "y", "z", "y"];
        let (codes, encoding) = LabelEncoder::fit_transform(&labels).unwrap();
        for (code, label) in codes.iter().zip(labels.iter()) {
            assert_eq!(encoding.decode(*code).unwrap(), *label);
        }
        for code in 0..encoding.len() {
            assert_eq!(encoding.encode(encoding.decode(code).unwrap()).unwrap(), code);
        }
    }

    #[test]
    fn test_idempotent() {
        let labels = ["b", "a", "b"];
        let (first, enc_first) = LabelEncoder::fit_transform(&labels).unwrap();
        let (second, enc_second) = LabelEncoder::fit_transform(&labels).unwrap();
        assert_eq!(first, second);
        assert_eq!(enc_first, enc_second);
        assert_eq!(enc_first.transform(&labels).unwrap(), first);
    }

    #[test]
    fn test_unknown_label_and_code() {
        let (_, encoding) = LabelEncoder::fit_transform(&["a", "b"]).unwrap();
        assert!(matches!(encoding.encode("c"), Err(ExperimentError::UnknownLabel(_))));
        assert!(matches!(encoding.decode(2), Err(ExperimentError::UnknownLabel(_))));
    }

    #[test]
    fn test_empty_labels() {
        let empty: [&str; 0] = [];
        assert!(matches!(LabelEncoder::fit_transform(&empty), Err(ExperimentError::DataQuality(_))));
    }
}
