//! ARIMA(p,d,q) estimation and forecasting.
//!
//! Estimation works on the `d`-times differenced closes. A mean term is
//! only fitted for `d = 0`.
//!
//! - `q = 0`: Yule–Walker (Levinson–Durbin), refined by conditional least
//!   squares when there are at least two rows per regressor. The refinement
//!   is discarded if it is singular or not stationary.
//! - `q > 0`: Hannan–Rissanen. A long AR fit estimates the innovations,
//!   then a regression on lagged values and lagged innovations gives the
//!   ARMA coefficients. Estimates that are not stationary or whose MA part
//!   is not invertible are rejected.
//!
//! Forecasts are computed recursively with future innovations set to zero
//! and integrated back to price levels.

use super::linalg::{autocovariances, is_stationary, levinson_durbin, ols};
use super::{FittedModel, ForecastModel, ModelFitError};
use crate::domain::{Dataset, ForecastResult};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Highest supported differencing order.
pub const MAX_DIFFERENCING: usize = 2;

/// Model order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Smallest series length the estimator accepts.
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + 1
    }

    pub fn validate(&self) -> Result<(), ModelFitError> {
        if self.d > MAX_DIFFERENCING {
            return Err(ModelFitError::InvalidOrder(format!(
                "d = {} exceeds the maximum of {MAX_DIFFERENCING}",
                self.d
            )));
        }
        Ok(())
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(5, 1, 0)
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Estimated parameters and fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub order: ArimaOrder,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Mean of the series; only estimated when `d = 0`.
    pub mean: Option<f64>,
    /// Innovation variance of the conditional residuals.
    pub sigma2: f64,
    /// Conditional Gaussian log-likelihood.
    pub log_likelihood: f64,
    /// Number of input observations (before differencing).
    pub n_obs: usize,
}

/// Unfitted ARIMA model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Arima {
    order: ArimaOrder,
}

impl Arima {
    pub fn new(order: ArimaOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Fit on a raw series of closes in chronological order.
    pub fn fit_series(&self, closes: &[f64]) -> Result<FittedArima, ModelFitError> {
        let order = self.order;
        order.validate()?;

        let n = closes.len();
        if n < order.min_observations() {
            return Err(ModelFitError::InsufficientData {
                required: order.min_observations(),
                actual: n,
            });
        }
        if let Some(i) = closes.iter().position(|v| !v.is_finite()) {
            return Err(ModelFitError::NonFinite(format!(
                "observation {i} is {}",
                closes[i]
            )));
        }
        if closes.iter().all(|v| *v == closes[0]) {
            return Err(ModelFitError::ZeroVariance);
        }

        // anchors[k] is the last value of the k-times differenced series.
        let mut anchors = Vec::with_capacity(order.d);
        let mut w = closes.to_vec();
        for _ in 0..order.d {
            anchors.push(w[w.len() - 1]);
            w = difference(&w);
        }
        if is_flat(&w) {
            return Err(ModelFitError::ZeroVariance);
        }

        let mean = (order.d == 0).then(|| w.iter().sum::<f64>() / w.len() as f64);
        let z: Vec<f64> = match mean {
            Some(m) => w.iter().map(|v| v - m).collect(),
            None => w,
        };

        let (ar, ma) = match (order.p, order.q) {
            (0, 0) => (Vec::new(), Vec::new()),
            (p, 0) => (fit_ar(&z, p)?, Vec::new()),
            (p, q) => hannan_rissanen(&z, p, q)?,
        };

        let residuals = conditional_residuals(&z, &ar, &ma);
        let m = z.len() - order.p;
        let sigma2 = residuals[order.p..].iter().map(|e| e * e).sum::<f64>() / m as f64;
        if !sigma2.is_finite() {
            return Err(ModelFitError::NonFinite("innovation variance".into()));
        }
        let log_likelihood = if sigma2 > 0.0 {
            -0.5 * m as f64 * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
        } else {
            f64::INFINITY
        };

        debug!(
            order = %order,
            n_obs = n,
            ar = ?ar,
            ma = ?ma,
            sigma2,
            "model fitted"
        );

        Ok(FittedArima {
            summary: FitSummary {
                order,
                ar,
                ma,
                mean,
                sigma2,
                log_likelihood,
                n_obs: n,
            },
            history: z,
            residuals,
            anchors,
        })
    }
}

impl ForecastModel for Arima {
    type Fitted = FittedArima;

    fn fit(&self, dataset: &Dataset) -> Result<FittedArima, ModelFitError> {
        self.fit_series(&dataset.closes())
    }

    fn name(&self) -> String {
        self.order.to_string()
    }
}

/// ARIMA model with estimated parameters and the state needed to forecast.
#[derive(Debug, Clone)]
pub struct FittedArima {
    summary: FitSummary,
    /// Differenced (and demeaned when d = 0) training series.
    history: Vec<f64>,
    residuals: Vec<f64>,
    anchors: Vec<f64>,
}

impl FittedArima {
    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult, ModelFitError> {
        if horizon == 0 {
            return Err(ModelFitError::InvalidHorizon);
        }
        let FitSummary { ar, ma, mean, .. } = &self.summary;

        let mut z = self.history.clone();
        let mut e = self.residuals.clone();
        z.reserve(horizon);
        e.reserve(horizon);
        for _ in 0..horizon {
            let t = z.len();
            let ar_part: f64 = ar.iter().enumerate().map(|(i, phi)| phi * z[t - 1 - i]).sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .filter(|(j, _)| *j < t)
                .map(|(j, theta)| theta * e[t - 1 - j])
                .sum();
            z.push(ar_part + ma_part);
            e.push(0.0);
        }

        let mut path: Vec<f64> = z[self.history.len()..]
            .iter()
            .map(|v| v + mean.unwrap_or(0.0))
            .collect();
        for &anchor in self.anchors.iter().rev() {
            path = integrate(anchor, &path);
        }

        if let Some(step) = path.iter().position(|v| !v.is_finite()) {
            return Err(ModelFitError::NonFinite(format!(
                "forecast step {} is {}",
                step + 1,
                path[step]
            )));
        }
        Ok(ForecastResult::from_values(self.name(), path))
    }

    fn name(&self) -> String {
        self.summary.order.to_string()
    }
}

/// Fit `order` on the dataset and forecast `horizon` steps.
pub fn forecast_dataset(
    dataset: &Dataset,
    order: ArimaOrder,
    horizon: usize,
) -> Result<ForecastResult, ModelFitError> {
    if horizon == 0 {
        return Err(ModelFitError::InvalidHorizon);
    }
    Arima::new(order).fit(dataset)?.forecast(horizon)
}

/// True when every value equals the first, up to rounding in the
/// differencing.
fn is_flat(w: &[f64]) -> bool {
    let Some(&first) = w.first() else {
        return true;
    };
    let tol = 1e-12 * first.abs().max(1.0);
    w.iter().all(|v| (v - first).abs() <= tol)
}

fn difference(x: &[f64]) -> Vec<f64> {
    x.windows(2).map(|w| w[1] - w[0]).collect()
}

fn integrate(anchor: f64, steps: &[f64]) -> Vec<f64> {
    let mut level = anchor;
    steps
        .iter()
        .map(|s| {
            level += s;
            level
        })
        .collect()
}

/// Yule–Walker start, conditional least-squares refinement.
fn fit_ar(z: &[f64], p: usize) -> Result<Vec<f64>, ModelFitError> {
    let gamma = autocovariances(z, p);
    if !(gamma[0] > 0.0) {
        return Err(ModelFitError::ZeroVariance);
    }
    let (yule_walker, _) = levinson_durbin(&gamma, p);

    let rows = z.len() - p;
    if rows < 2 * p {
        return Ok(yule_walker);
    }
    let (x, y) = lagged_design(z, p, p, |t, i| z[t - 1 - i]);
    match ols(&x, &y).map(|beta| beta.to_vec()) {
        Some(beta) if is_stationary(&beta) => Ok(beta),
        _ => {
            debug!(p, "least-squares refinement rejected, keeping Yule-Walker estimate");
            Ok(yule_walker)
        }
    }
}

/// Two-stage regression for ARMA(p, q).
fn hannan_rissanen(z: &[f64], p: usize, q: usize) -> Result<(Vec<f64>, Vec<f64>), ModelFitError> {
    let n = z.len();
    let long = (p + q)
        .max(((n as f64).ln() * 2.0) as usize)
        .min(n.saturating_sub(p + q + 1) / 2);
    if long == 0 {
        return Err(ModelFitError::Singular("long autoregression".into()));
    }

    let gamma = autocovariances(z, long);
    let (phi_long, _) = levinson_durbin(&gamma, long);
    let innovations: Vec<f64> = (0..n)
        .map(|t| {
            if t < long {
                0.0
            } else {
                z[t] - (0..long).map(|i| phi_long[i] * z[t - 1 - i]).sum::<f64>()
            }
        })
        .collect();

    let start = p.max(long + q);
    let (x, y) = lagged_design(z, start, p + q, |t, k| {
        if k < p {
            z[t - 1 - k]
        } else {
            innovations[t - 1 - (k - p)]
        }
    });
    if x.nrows() < p + q {
        return Err(ModelFitError::Singular("ARMA regression".into()));
    }
    let beta = ols(&x, &y).ok_or_else(|| ModelFitError::Singular("ARMA regression".into()))?;
    let (ar, ma) = (beta.slice(s![..p]).to_vec(), beta.slice(s![p..]).to_vec());

    if !is_stationary(&ar) {
        return Err(ModelFitError::NonStationary(format!("AR coefficients {ar:?}")));
    }
    // 1 + θ1 z + ... + θq z^q must have its roots outside the unit circle.
    let negated: Vec<f64> = ma.iter().map(|theta| -theta).collect();
    if !is_stationary(&negated) {
        return Err(ModelFitError::NonStationary(format!(
            "MA coefficients {ma:?} are not invertible"
        )));
    }
    Ok((ar, ma))
}

/// Regression rows for `t` in `start..z.len()` with `cols` regressors.
fn lagged_design(
    z: &[f64],
    start: usize,
    cols: usize,
    regressor: impl Fn(usize, usize) -> f64,
) -> (Array2<f64>, Array1<f64>) {
    let rows = z.len().saturating_sub(start);
    let x = Array2::from_shape_fn((rows, cols), |(r, k)| regressor(start + r, k));
    let y = Array1::from_iter(z[start.min(z.len())..].iter().copied());
    (x, y)
}

/// One-step-ahead residuals conditional on the first `p` observations.
fn conditional_residuals(z: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut e = vec![0.0; z.len()];
    for t in p..z.len() {
        let ar_part: f64 = ar.iter().enumerate().map(|(i, phi)| phi * z[t - 1 - i]).sum();
        let ma_part: f64 = ma
            .iter()
            .enumerate()
            .filter(|(j, _)| *j < t)
            .map(|(j, theta)| theta * e[t - 1 - j])
            .sum();
        e[t] = z[t] - ar_part - ma_part;
    }
    e
}
