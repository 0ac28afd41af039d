use dualfit_helpers::{check_fit_inputs, check_predict_inputs, Float, ShapeError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_stats::QuantileExt;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors that can occur during support vector training or prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum SvmError {
    /// The inputs do not have a usable shape.
    Shape(ShapeError),
    /// A target is not a non-negative integer class index.
    NonIntegralLabel { row: usize, value: String },
    /// Fewer than two distinct classes were found in the targets.
    TooFewClasses(usize),
    /// A hyperparameter is out of range.
    InvalidConfig(String),
}

impl Display for SvmError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SvmError::Shape(e) => write!(f, "Invalid input: {}", e),
            SvmError::NonIntegralLabel { row, value } => write!(
                f,
                "Classifier requires integer class labels, but row {} has label {}",
                row, value
            ),
            SvmError::TooFewClasses(n) => {
                write!(f, "Classifier requires at least 2 distinct classes, found {}", n)
            }
            SvmError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}
impl Error for SvmError {}

impl From<ShapeError> for SvmError {
    fn from(e: ShapeError) -> Self {
        SvmError::Shape(e)
    }
}

/// A linear-kernel support vector classifier.
///
/// Each pair of classes gets its own binary machine (one-vs-one), trained with
/// the simplified SMO algorithm. Prediction is a majority vote over all pairs;
/// ties go to the lowest class index.
///
/// This is the unfitted configuration. [`LinearSvc::fit`] borrows it immutably
/// and returns a new [`FittedLinearSvc`] on every call.
#[derive(Debug, Clone)]
pub struct LinearSvc<F: Float> {
    c: F,
    tol: F,
    max_passes: usize,
    max_iter: usize,
    seed: u64,
}

impl<F: Float> Default for LinearSvc<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> LinearSvc<F> {
    /// Creates a classifier with `C = 1`, `tol = 1e-3`, 5 quiet passes,
    /// at most 1000 sweeps and seed 42.
    pub fn new() -> Self {
        Self {
            c: F::one(),
            tol: F::cast(1e-3).unwrap_or_else(F::epsilon),
            max_passes: 5,
            max_iter: 1000,
            seed: 42,
        }
    }

    /// Regularisation strength; larger values penalise margin violations more.
    pub fn with_c(mut self, c: F) -> Self {
        self.c = c;
        self
    }

    /// KKT violation tolerance.
    pub fn with_tol(mut self, tol: F) -> Self {
        self.tol = tol;
        self
    }

    /// Number of consecutive sweeps without updates before stopping.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Hard cap on the number of sweeps per binary machine.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Seed for the partner selection in SMO.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<(), SvmError> {
        if !(self.c > F::zero()) || !self.c.is_finite() {
            return Err(SvmError::InvalidConfig(format!("C must be positive, got {}", self.c)));
        }
        if !(self.tol > F::zero()) {
            return Err(SvmError::InvalidConfig(format!("tol must be positive, got {}", self.tol)));
        }
        if self.max_passes == 0 || self.max_iter == 0 {
            return Err(SvmError::InvalidConfig(
                "max_passes and max_iter must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Trains one binary machine per class pair.
    ///
    /// # Arguments
    ///
    /// * `x`: Training features, one row per sample.
    /// * `y`: Class indices stored as floats; every value must be a non-negative integer.
    ///
    /// # Errors
    ///
    /// Returns `SvmError::Shape` for empty, ragged or non-finite input,
    /// `SvmError::NonIntegralLabel` for fractional or negative targets and
    /// `SvmError::TooFewClasses` when only one class is present.
    pub fn fit(&self, x: ArrayView2<F>, y: ArrayView1<F>) -> Result<FittedLinearSvc<F>, SvmError> {
        self.validate()?;
        check_fit_inputs(x, y)?;

        let labels = y
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.as_class_index().ok_or_else(|| SvmError::NonIntegralLabel {
                    row,
                    value: format!("{}", v),
                })
            })
            .collect::<Result<Vec<usize>, SvmError>>()?;

        let mut classes = labels.clone();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(SvmError::TooFewClasses(classes.len()));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut machines = Vec::with_capacity(classes.len() * (classes.len() - 1) / 2);

        for a in 0..classes.len() {
            for b in (a + 1)..classes.len() {
                let rows: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|&(_, &l)| l == classes[a] || l == classes[b])
                    .map(|(i, _)| i)
                    .collect();

                let mut pair_x = Array2::<F>::zeros((rows.len(), x.ncols()));
                for (dst, &src) in rows.iter().enumerate() {
                    pair_x.row_mut(dst).assign(&x.row(src));
                }
                let pair_y: Array1<F> = rows
                    .iter()
                    .map(|&i| if labels[i] == classes[a] { F::one() } else { -F::one() })
                    .collect();

                machines.push(self.smo(pair_x.view(), pair_y.view(), a, b, &mut rng));
            }
        }

        Ok(FittedLinearSvc { classes, machines, n_features: x.ncols() })
    }

    /// Simplified SMO for a linear kernel.
    ///
    /// The weight vector `w = Σ αᵢ yᵢ xᵢ` is kept up to date, so the decision
    /// value of a sample costs one dot product.
    fn smo<R: Rng>(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        positive: usize,
        negative: usize,
        rng: &mut R,
    ) -> BinaryMachine<F> {
        let n = x.nrows();
        let mut alphas = Array1::<F>::zeros(n);
        let mut weights = Array1::<F>::zeros(x.ncols());
        let mut bias = F::zero();
        let two = F::one() + F::one();
        let min_step = F::cast(1e-5).unwrap_or_else(F::epsilon);

        let mut passes = 0;
        let mut sweeps = 0;
        while passes < self.max_passes && sweeps < self.max_iter && n > 1 {
            let mut changed = 0;

            for i in 0..n {
                let e_i = weights.dot(&x.row(i)) + bias - y[i];
                let violates = (y[i] * e_i < -self.tol && alphas[i] < self.c)
                    || (y[i] * e_i > self.tol && alphas[i] > F::zero());
                if !violates {
                    continue;
                }

                let j = loop {
                    let j = rng.random_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = weights.dot(&x.row(j)) + bias - y[j];

                let alpha_i_old = alphas[i];
                let alpha_j_old = alphas[j];
                let (low, high) = if y[i] != y[j] {
                    (
                        (alpha_j_old - alpha_i_old).max(F::zero()),
                        (self.c + alpha_j_old - alpha_i_old).min(self.c),
                    )
                } else {
                    (
                        (alpha_i_old + alpha_j_old - self.c).max(F::zero()),
                        (alpha_i_old + alpha_j_old).min(self.c),
                    )
                };
                if low >= high {
                    continue;
                }

                let k_ii = x.row(i).dot(&x.row(i));
                let k_jj = x.row(j).dot(&x.row(j));
                let k_ij = x.row(i).dot(&x.row(j));
                let eta = two * k_ij - k_ii - k_jj;
                if eta >= F::zero() {
                    continue;
                }

                let alpha_j = (alpha_j_old - y[j] * (e_i - e_j) / eta).max(low).min(high);
                if dualfit_helpers::abs(alpha_j - alpha_j_old) < min_step {
                    continue;
                }
                let alpha_i = alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j);

                let d_i = y[i] * (alpha_i - alpha_i_old);
                let d_j = y[j] * (alpha_j - alpha_j_old);
                weights.scaled_add(d_i, &x.row(i));
                weights.scaled_add(d_j, &x.row(j));

                let b1 = bias - e_i - d_i * k_ii - d_j * k_ij;
                let b2 = bias - e_j - d_i * k_ij - d_j * k_jj;
                bias = if alpha_i > F::zero() && alpha_i < self.c {
                    b1
                } else if alpha_j > F::zero() && alpha_j < self.c {
                    b2
                } else {
                    (b1 + b2) / two
                };

                alphas[i] = alpha_i;
                alphas[j] = alpha_j;
                changed += 1;
            }

            sweeps += 1;
            if changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let threshold = F::cast(1e-8).unwrap_or_else(F::epsilon);
        let n_support = alphas.iter().filter(|&&a| a > threshold).count();

        BinaryMachine { positive, negative, weights, bias, n_support }
    }
}

/// One-vs-one machine separating two classes.
///
/// `positive` and `negative` are positions in [`FittedLinearSvc::classes`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMachine<F: Float> {
    pub positive: usize,
    pub negative: usize,
    pub weights: Array1<F>,
    pub bias: F,
    pub n_support: usize,
}

impl<F: Float> BinaryMachine<F> {
    pub fn decision(&self, features: ArrayView1<F>) -> F {
        self.weights.dot(&features) + self.bias
    }
}

/// A trained one-vs-one linear classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLinearSvc<F: Float> {
    classes: Vec<usize>,
    machines: Vec<BinaryMachine<F>>,
    n_features: usize,
}

impl<F: Float> FittedLinearSvc<F> {
    /// Sorted class indices seen during training.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn machines(&self) -> &[BinaryMachine<F>] {
        &self.machines
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predicts the class index of a single sample.
    pub fn predict_one(&self, features: ArrayView1<F>) -> Result<usize, SvmError> {
        let mut votes = Array1::<usize>::zeros(self.classes.len());
        for machine in &self.machines {
            if machine.decision(features) > F::zero() {
                votes[machine.positive] += 1;
            } else {
                votes[machine.negative] += 1;
            }
        }
        let winner = votes.argmax().map_err(|_| SvmError::Shape(ShapeError::EmptyInput))?;
        Ok(self.classes[winner])
    }

    /// Predicts a class index for every row of `x`.
    pub fn predict(&self, x: ArrayView2<F>) -> Result<Array1<usize>, SvmError> {
        check_predict_inputs(x, self.n_features)?;
        x.rows().into_iter().map(|row| self.predict_one(row)).collect()
    }

    /// Fraction of rows whose predicted class equals the target.
    pub fn score(&self, x: ArrayView2<F>, y: ArrayView1<F>) -> Result<F, SvmError> {
        let predicted = self.predict(x)?;
        if predicted.len() != y.len() {
            return Err(ShapeError::LengthMismatch { rows: predicted.len(), targets: y.len() }.into());
        }
        if predicted.is_empty() {
            return Err(ShapeError::EmptyInput.into());
        }
        let correct = predicted
            .iter()
            .zip(y.iter())
            .filter(|&(p, t)| t.as_class_index() == Some(*p))
            .count();
        Ok(F::cast(correct).unwrap_or_else(F::zero) / F::cast(predicted.len()).unwrap_or_else(F::one))
    }
}
