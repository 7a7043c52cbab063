//! Serializable pipeline configuration.
//!
//! Every stage receives its inputs from a [`PipelineConfig`] passed in by the
//! caller. Missing TOML keys fall back to the documented defaults.

use chrono::NaiveDate;
use pricecast_core::data::ProviderSettings;
use pricecast_core::model::ArimaOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_DATASET: &str = "data/aapl_stock_data.csv";
pub const DEFAULT_HORIZON: usize = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("forecast horizon must be at least 1")]
    ZeroHorizon,

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("invalid model order: {0}")]
    InvalidOrder(String),
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ticker to ingest.
    pub symbol: String,

    /// First date requested (inclusive).
    pub start: NaiveDate,

    /// Last date requested (exclusive).
    pub end: NaiveDate,

    /// Dataset file, overwritten by every ingestion.
    pub dataset: PathBuf,

    /// Number of forecast steps.
    pub horizon: usize,

    pub order: ArimaOrder,

    pub provider: ProviderSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            dataset: PathBuf::from(DEFAULT_DATASET),
            horizon: DEFAULT_HORIZON,
            order: ArimaOrder::default(),
            provider: ProviderSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.start > self.end {
            return Err(ConfigError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        self.order
            .validate()
            .map_err(|e| ConfigError::InvalidOrder(e.to_string()))
    }
}
