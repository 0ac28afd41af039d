//! Small dense solvers for the normal equations of linear models.

use crate::{abs, Float};
use ndarray::{Array1, Array2};

/// Solves the symmetric positive-definite system `a x = b`.
///
/// Tries a Cholesky factorisation first. A matrix that is only
/// semi-definite gets a tiny ridge on the diagonal and one more attempt;
/// if that still fails, Gaussian elimination with partial pivoting is used.
/// Returns `None` when the system is singular.
pub fn solve_spd<F: Float>(a: &Array2<F>, b: &Array1<F>) -> Option<Array1<F>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    if let Some(x) = cholesky_solve(a, b) {
        return Some(x);
    }

    let trace: F = a.diag().iter().map(|v| abs(*v)).sum();
    let ridge = F::cast(1e-8)? * trace / F::cast(n.max(1))?;
    let mut regularised = a.clone();
    for k in 0..n {
        regularised[[k, k]] += ridge;
    }
    if let Some(x) = cholesky_solve(&regularised, b) {
        return Some(x);
    }

    gaussian_solve(a, b)
}

fn cholesky_solve<F: Float>(a: &Array2<F>, b: &Array1<F>) -> Option<Array1<F>> {
    let n = a.nrows();
    let mut l = Array2::<F>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = F::zero();
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= F::zero() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<F>::zeros(n);
    for i in 0..n {
        let mut sum = F::zero();
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<F>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = F::zero();
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

fn gaussian_solve<F: Float>(a: &Array2<F>, b: &Array1<F>) -> Option<Array1<F>> {
    let n = a.nrows();
    let pivot_floor = F::cast(1e-12)?;
    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        let mut best = col;
        for row in (col + 1)..n {
            if abs(m[[row, col]]) > abs(m[[best, col]]) {
                best = row;
            }
        }
        if abs(m[[best, col]]) < pivot_floor {
            return None;
        }
        if best != col {
            for j in 0..n {
                m.swap([col, j], [best, j]);
            }
            rhs.swap(col, best);
        }
        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            for j in col..n {
                let delta = factor * m[[col, j]];
                m[[row, j]] -= delta;
            }
            let delta = factor * rhs[col];
            rhs[row] -= delta;
        }
    }

    let mut x = Array1::<F>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..n {
            sum -= m[[i, j]] * x[j];
        }
        x[i] = sum / m[[i, i]];
    }
    Some(x)
}
