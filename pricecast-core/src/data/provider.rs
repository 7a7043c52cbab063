//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over market-data sources (Yahoo Finance,
//! synthetic data) so ingestion can be exercised without the network.

use crate::domain::RawBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Structured acquisition failures.
///
/// Displayable in log lines and CLI output.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned no rows for '{symbol}' between {start} and {end}")]
    EmptyResponse {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::YahooFinance => "yahoo_finance",
            DataSource::Synthetic => "synthetic",
        }
    }
}

/// Trait for market-data providers.
///
/// Implementations fetch daily bars over the half-open range `[start, end)`.
/// The dataset store sits above this trait; providers don't know about files.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over `[start, end)`.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, ProviderError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// HTTP and backoff settings for network providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub base_delay_ms: u64,
    /// How long the circuit breaker stays open once tripped.
    pub breaker_cooldown_secs: u64,
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            breaker_cooldown_secs: 30 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_documented_values() {
        let s = ProviderSettings::default();
        assert_eq!(s.timeout(), Duration::from_secs(30));
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.base_delay(), Duration::from_millis(500));
        assert_eq!(s.breaker_cooldown(), Duration::from_secs(1800));
    }

    #[test]
    fn empty_response_message_names_symbol_and_range() {
        let err = ProviderError::EmptyResponse {
            symbol: "ZZZZ".into(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ZZZZ"));
        assert!(msg.contains("2020-01-01"));
    }
}
