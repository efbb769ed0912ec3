//! Ordinary least squares.
//!
//! The forecaster only ever fits one regressor plus an intercept:
//!
//! ```text
//! minimize Σ (y_i - (b + a·x_i))^2
//! ```
//!
//! We still go through a general solver so the design matrix can grow
//! (extra regressors) without touching the callers.
//!
//! Implementation choices:
//! - SVD solve, which handles tall design matrices (many more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - A rank-deficient design (all `x` identical) is rejected before solving;
//!   SVD would otherwise return a minimum-norm answer that looks plausible.

use nalgebra::{DMatrix, DVector};

/// Relative tolerance on the regressor spread used to flag a degenerate design.
const DEGENERATE_EPS: f64 = 1e-12;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Intercept and slope of a simple linear fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Why a line could not be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFitError {
    /// `x` and `y` have different lengths or fewer than two points.
    Shape,
    /// Every `x` is the same value.
    Degenerate,
    /// An input or the solution is NaN/inf.
    NonFinite,
}

/// Fit `y = intercept + slope·x`.
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<LineFit, LineFitError> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return Err(LineFitError::Shape);
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return Err(LineFitError::NonFinite);
    }

    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let scale = lo.abs().max(hi.abs()).max(1.0);
    if (hi - lo) <= DEGENERATE_EPS * scale {
        return Err(LineFitError::Degenerate);
    }

    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { x[row] });
    let target = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &target).ok_or(LineFitError::NonFinite)?;
    Ok(LineFit {
        intercept: beta[0],
        slope: beta[1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_noisy_trend() {
        // Residuals +1, -1, -1, +1 around y = 10 + 2x cancel out.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [11.0, 11.0, 13.0, 17.0];
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9, "slope {}", fit.slope);
        assert!((fit.intercept - 10.0).abs() < 1e-9, "intercept {}", fit.intercept);
    }

    #[test]
    fn fit_line_rejects_bad_inputs() {
        assert_eq!(fit_line(&[1.0], &[1.0]), Err(LineFitError::Shape));
        assert_eq!(fit_line(&[1.0, 2.0], &[1.0]), Err(LineFitError::Shape));
        assert_eq!(fit_line(&[4.0, 4.0, 4.0], &[1.0, 2.0, 3.0]), Err(LineFitError::Degenerate));
        assert_eq!(fit_line(&[0.0, 1.0], &[f64::NAN, 1.0]), Err(LineFitError::NonFinite));
    }
}
