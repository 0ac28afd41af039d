use ndarray::{ArrayView1, ArrayView2};
use crate::Float;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input shape problems shared by every estimator in the workspace.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// No rows were supplied.
    EmptyInput,
    /// The design matrix has zero columns.
    NoFeatures,
    /// The number of targets differs from the number of rows.
    LengthMismatch { rows: usize, targets: usize },
    /// A prediction matrix has a different width than the training matrix.
    FeatureMismatch { expected: usize, actual: usize },
    /// A feature or target is NaN or infinite.
    NonFinite { row: usize },
}

impl Display for ShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeError::EmptyInput => write!(f, "Input has no rows"),
            ShapeError::NoFeatures => write!(f, "Input has no feature columns"),
            ShapeError::LengthMismatch { rows, targets } => {
                write!(f, "Got {} rows but {} targets", rows, targets)
            }
            ShapeError::FeatureMismatch { expected, actual } => {
                write!(f, "Expected {} features, got {}", expected, actual)
            }
            ShapeError::NonFinite { row } => write!(f, "Row {} contains a non-finite value", row),
        }
    }
}

impl Error for ShapeError {}

/// Validates a training pair before any estimator touches it.
pub fn check_fit_inputs<F: Float>(x: ArrayView2<F>, y: ArrayView1<F>) -> Result<(), ShapeError> {
    if x.nrows() == 0 {
        return Err(ShapeError::EmptyInput);
    }
    if x.ncols() == 0 {
        return Err(ShapeError::NoFeatures);
    }
    if x.nrows() != y.len() {
        return Err(ShapeError::LengthMismatch { rows: x.nrows(), targets: y.len() });
    }
    for (i, (row, target)) in x.rows().into_iter().zip(y.iter()).enumerate() {
        if !target.is_finite() || row.iter().any(|v| !v.is_finite()) {
            return Err(ShapeError::NonFinite { row: i });
        }
    }
    Ok(())
}

/// Validates a prediction matrix against the width seen during training.
pub fn check_predict_inputs<F: Float>(x: ArrayView2<F>, n_features: usize) -> Result<(), ShapeError> {
    if x.ncols() != n_features {
        return Err(ShapeError::FeatureMismatch { expected: n_features, actual: x.ncols() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_fit_inputs_ok() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        assert!(check_fit_inputs(x.view(), y.view()).is_ok());
    }

    #[test]
    fn test_fit_inputs_errors() {
        let empty: Array2<f64> = Array2::zeros((0, 2));
        let no_y: Array1<f64> = Array1::zeros(0);
        assert_eq!(check_fit_inputs(empty.view(), no_y.view()), Err(ShapeError::EmptyInput));

        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let short = array![0.0];
        assert_eq!(
            check_fit_inputs(x.view(), short.view()),
            Err(ShapeError::LengthMismatch { rows: 2, targets: 1 })
        );

        let nan = array![[1.0, f64::NAN], [3.0, 4.0]];
        let y = array![0.0, 1.0];
        assert_eq!(check_fit_inputs(nan.view(), y.view()), Err(ShapeError::NonFinite { row: 0 }));
    }

    #[test]
    fn test_predict_inputs_width() {
        let x = array![[1.0, 2.0, 3.0]];
        assert_eq!(
            check_predict_inputs(x.view(), 2),
            Err(ShapeError::FeatureMismatch { expected: 2, actual: 3 })
        );
        assert!(check_predict_inputs(x.view(), 3).is_ok());
    }
}
