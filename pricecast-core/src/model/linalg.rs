//! Small dense solvers for the AR/ARMA estimators.

use ndarray::{Array1, Array2};

/// Relative pivot tolerance for the Cholesky factorization.
const PIVOT_TOL: f64 = 1e-12;

/// Sample autocovariances `γ(0..=max_lag)` with the biased `1/n` divisor.
///
/// The series is used as given; callers demean it when a mean term applies.
pub fn autocovariances(z: &[f64], max_lag: usize) -> Vec<f64> {
    let n = z.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            z[..n - k]
                .iter()
                .zip(&z[k..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n as f64
        })
        .collect()
}

/// Levinson–Durbin recursion on autocovariances `gamma[0..=order]`.
///
/// Returns the Yule–Walker AR coefficients and the innovation variance. If
/// the prediction error variance collapses before `order` is reached, the
/// recursion stops and the remaining coefficients stay zero.
pub fn levinson_durbin(gamma: &[f64], order: usize) -> (Vec<f64>, f64) {
    let mut phi = vec![0.0; order];
    let mut v = gamma.first().copied().unwrap_or(0.0);
    if !(v > 0.0) || gamma.len() <= order {
        return (phi, v.max(0.0));
    }

    for k in 1..=order {
        let mut acc = gamma[k];
        for j in 1..k {
            acc -= phi[j - 1] * gamma[k - j];
        }
        let kappa = acc / v;
        let next_v = v * (1.0 - kappa * kappa);
        if !kappa.is_finite() || !(next_v > 0.0) {
            break;
        }

        let prev = phi.clone();
        phi[k - 1] = kappa;
        for j in 1..k {
            phi[j - 1] = prev[j - 1] - kappa * prev[k - j - 1];
        }
        v = next_v;
    }
    (phi, v)
}

/// True when every root of `1 - φ1 z - ... - φp z^p` lies outside the unit
/// circle, checked by stepping the coefficients down to partial
/// autocorrelations.
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    while let Some(&kappa) = a.last() {
        if !(kappa.abs() < 1.0) {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - kappa * kappa;
        a = (1..k)
            .map(|j| (a[j - 1] + kappa * a[k - j - 1]) / denom)
            .collect();
    }
    true
}

/// Solve `A x = b` for symmetric positive-definite `A`.
///
/// Returns `None` when `A` is not square, not positive definite, or
/// numerically singular.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return None;
    }
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !(scale > 0.0) {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > PIVOT_TOL * scale) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[[i, k]] * y[k]).sum();
        y[i] = (b[i] - s) / l[[i, i]];
    }
    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let s: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (y[i] - s) / l[[i, i]];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Least squares via the normal equations `XᵀX β = Xᵀy`.
pub fn ols(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    if x.nrows() != y.len() || x.nrows() < x.ncols() {
        return None;
    }
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    cholesky_solve(&xtx, &xty)
}
