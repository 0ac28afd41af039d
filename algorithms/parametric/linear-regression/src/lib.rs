use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use std::error::Error;
use std::fmt::{Display, Formatter};
// Core components from the shared helpers crate.
use dualfit_helpers::linalg::solve_spd;
use dualfit_helpers::{check_fit_inputs, check_predict_inputs, Float, ShapeError};

/// Errors that can occur when fitting or using a linear regression.
#[derive(Debug, Clone, PartialEq)]
pub enum LinearRegressionError {
    /// The inputs do not have a usable shape.
    Shape(ShapeError),
    /// The normal equations have no unique solution.
    SingularMatrix,
}

impl Display for LinearRegressionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LinearRegressionError::Shape(e) => write!(f, "Invalid input: {}", e),
            LinearRegressionError::SingularMatrix => {
                write!(f, "Normal equations are singular, cannot solve least squares")
            }
        }
    }
}

impl Error for LinearRegressionError {}

impl From<ShapeError> for LinearRegressionError {
    fn from(e: ShapeError) -> Self {
        LinearRegressionError::Shape(e)
    }
}

/// Ordinary least squares regression.
///
/// This is the unfitted configuration. Calling [`LinearRegression::fit`] never
/// mutates it; every call produces an independent [`FittedLinearRegression`].
#[derive(Debug, Clone, Copy)]
pub struct LinearRegression {
    fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self { fit_intercept: true }
    }

    /// Enable or disable the intercept term.
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fits the model by solving `(XᵀX) w = Xᵀy`.
    ///
    /// With an intercept, `X` and `y` are centred first and the intercept is
    /// recovered as `mean(y) - w · mean(X)`.
    ///
    /// # Errors
    ///
    /// Returns `LinearRegressionError::Shape` for empty, ragged or non-finite input.
    /// Returns `LinearRegressionError::SingularMatrix` if `XᵀX` cannot be solved.
    pub fn fit<F: Float>(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
    ) -> Result<FittedLinearRegression<F>, LinearRegressionError> {
        check_fit_inputs(x, y)?;

        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x.mean_axis(Axis(0)).ok_or(ShapeError::EmptyInput)?;
            let y_mean = y.mean().ok_or(ShapeError::EmptyInput)?;
            let x_centered = &x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = &y - y_mean;

            let xtx = x_centered.t().dot(&x_centered);
            let xty = x_centered.t().dot(&y_centered);
            let w = solve_spd(&xtx, &xty).ok_or(LinearRegressionError::SingularMatrix)?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            let xtx = x.t().dot(&x);
            let xty = x.t().dot(&y);
            let w = solve_spd(&xtx, &xty).ok_or(LinearRegressionError::SingularMatrix)?;
            (w, F::zero())
        };

        Ok(FittedLinearRegression { coefficients, intercept })
    }
}

/// A fitted linear model `y = X w + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLinearRegression<F: Float> {
    coefficients: Array1<F>,
    intercept: F,
}

impl<F: Float> FittedLinearRegression<F> {
    pub fn coefficients(&self) -> ArrayView1<'_, F> {
        self.coefficients.view()
    }

    pub fn intercept(&self) -> F {
        self.intercept
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predicts a continuous value for every row of `x`.
    pub fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>, LinearRegressionError> {
        check_predict_inputs(x, self.n_features())?;
        Ok(x.dot(&self.coefficients) + self.intercept)
    }

    /// Coefficient of determination of the predictions on `(x, y)`.
    pub fn score(&self, x: ArrayView2<F>, y: ArrayView1<F>) -> Result<F, LinearRegressionError> {
        let y_pred = self.predict(x)?;
        if y_pred.len() != y.len() {
            return Err(ShapeError::LengthMismatch { rows: y_pred.len(), targets: y.len() }.into());
        }
        r2_score(y, y_pred.view()).ok_or_else(|| ShapeError::EmptyInput.into())
    }
}

/// R² = 1 - SS_res / SS_tot.
///
/// A constant `y_true` has `SS_tot = 0`; the score is then 1 for a perfect fit
/// and 0 otherwise. Returns `None` for empty or mismatched input.
pub fn r2_score<F: Float>(y_true: ArrayView1<F>, y_pred: ArrayView1<F>) -> Option<F> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return None;
    }
    let mean = y_true.mean()?;
    let ss_res: F = y_true.iter().zip(y_pred.iter()).map(|(t, p)| (*t - *p) * (*t - *p)).sum();
    let ss_tot: F = y_true.iter().map(|t| (*t - mean) * (*t - mean)).sum();

    if ss_tot == F::zero() {
        return Some(if ss_res == F::zero() { F::one() } else { F::zero() });
    }
    Some(F::one() - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn make_linear_data() -> (Array2<f64>, Array1<f64>) {
        // y = 2 x0 - 3 x1 + 0.5
        let x = array![
            [0.0, 1.0],
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 5.0],
            [4.0, 2.0],
            [5.0, 3.0],
        ];
        let y = x.rows().into_iter().map(|r| 2.0 * r[0] - 3.0 * r[1] + 0.5).collect();
        (x, y)
    }

    #[test]
    fn test_fit_recovers_exact_coefficients() {
        let (x, y) = make_linear_data();
        let model = LinearRegression::new().fit(x.view(), y.view()).unwrap();
        assert_abs_diff_eq!(model.coefficients().to_owned(), array![2.0, -3.0], epsilon = 1e-8);
        assert_abs_diff_eq!(model.intercept(), 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(model.score(x.view(), y.view()).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fit_without_intercept() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let model = LinearRegression::new()
            .with_fit_intercept(false)
            .fit(x.view(), y.view())
            .unwrap();
        assert_abs_diff_eq!(model.coefficients()[0], 2.0, epsilon = 1e-10);
        assert_eq!(model.intercept(), 0.0);
    }

    #[test]
    fn test_refit_produces_independent_models() {
        let (x, y) = make_linear_data();
        let estimator = LinearRegression::new();
        let first = estimator.fit(x.view(), y.view()).unwrap();
        let shifted = &y + 10.0;
        let second = estimator.fit(x.view(), shifted.view()).unwrap();
        assert_abs_diff_eq!(first.intercept(), 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(second.intercept(), 10.5, epsilon = 1e-8);
    }

    #[test]
    fn test_predict_feature_mismatch() {
        let (x, y) = make_linear_data();
        let model = LinearRegression::new().fit(x.view(), y.view()).unwrap();
        let wide = array![[1.0, 2.0, 3.0]];
        assert_eq!(
            model.predict(wide.view()),
            Err(LinearRegressionError::Shape(ShapeError::FeatureMismatch { expected: 2, actual: 3 }))
        );
    }

    #[test]
    fn test_singular_design() {
        // Both columns are constant, so the centred design is all zeros.
        let x = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];
        let result = LinearRegression::new().fit(x.view(), y.view());
        assert_eq!(result.unwrap_err(), LinearRegressionError::SingularMatrix);
    }

    #[test]
    fn test_empty_input() {
        let x: Array2<f64> = Array2::zeros((0, 2));
        let y: Array1<f64> = Array1::zeros(0);
        let result = LinearRegression::new().fit(x.view(), y.view());
        assert_eq!(result.unwrap_err(), LinearRegressionError::Shape(ShapeError::EmptyInput));
    }

    #[test]
    fn test_r2_score_bounds() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(r2_score(y.view(), y.view()).unwrap(), 1.0);
        let mean_pred = array![2.5, 2.5, 2.5, 2.5];
        assert_abs_diff_eq!(r2_score(y.view(), mean_pred.view()).unwrap(), 0.0);
        let bad = array![4.0, 3.0, 2.0, 1.0];
        assert!(r2_score(y.view(), bad.view()).unwrap() < 0.0);
    }

    #[test]
    fn test_r2_score_constant_target() {
        let y = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(y.view(), y.view()), Some(1.0));
        let off = array![2.0, 2.0, 3.0];
        assert_eq!(r2_score(y.view(), off.view()), Some(0.0));
        assert_eq!(r2_score(y.view(), array![1.0].view()), None);
    }
}
