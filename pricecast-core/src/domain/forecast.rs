//! Forecast output: point estimates for a fixed horizon.

use serde::{Deserialize, Serialize};

/// One forecast step. `step` is 1-based: step 1 is the first period after
/// the last observed date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub step: usize,
    pub predicted_close: f64,
}

/// Point forecast for a fixed horizon. Produced fresh per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Label of the model that produced the forecast, e.g. `ARIMA(5,1,0)`.
    pub model: String,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    pub fn from_values(model: impl Into<String>, values: Vec<f64>) -> Self {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, predicted_close)| ForecastPoint {
                step: i + 1,
                predicted_close,
            })
            .collect();
        Self {
            model: model.into(),
            points,
        }
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_close).collect()
    }
}
