//! Forecasting models.
//!
//! A model is configured, fitted on a cleaned [`Dataset`], and the fitted
//! model produces point forecasts. Nothing is persisted between runs.

pub mod arima;
pub mod linalg;

pub use arima::{forecast_dataset, Arima, ArimaOrder, FitSummary, FittedArima};

use crate::domain::{Dataset, ForecastResult};
use std::fmt::Debug;
use thiserror::Error;

/// Why a fit or forecast could not be produced.
///
/// Recoverable per invocation: the caller reports it and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFitError {
    #[error("invalid model order: {0}")]
    InvalidOrder(String),

    #[error("forecast horizon must be at least 1")]
    InvalidHorizon,

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series has zero variance")]
    ZeroVariance,

    #[error("non-finite value encountered: {0}")]
    NonFinite(String),

    #[error("estimated model is not stationary or invertible: {0}")]
    NonStationary(String),

    #[error("singular system while estimating {0}")]
    Singular(String),
}

/// A model that can be fitted to a price series.
pub trait ForecastModel: Debug {
    type Fitted: FittedModel;

    /// Fit on the dataset's closes in date order.
    fn fit(&self, dataset: &Dataset) -> Result<Self::Fitted, ModelFitError>;

    fn name(&self) -> String;
}

/// A fitted model ready to forecast.
pub trait FittedModel: Debug {
    /// Point forecasts for steps `1..=horizon` past the last observation.
    fn forecast(&self, horizon: usize) -> Result<ForecastResult, ModelFitError>;

    fn name(&self) -> String;
}
