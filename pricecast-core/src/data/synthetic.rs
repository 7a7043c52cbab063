//! Synthetic price provider for offline development and tests.
//!
//! Produces a weekday-only random walk starting at 100.0. The RNG seed is the
//! BLAKE3 hash of the symbol, so the same request always yields the same bars.

use super::provider::{DataSource, FetchResult, PriceProvider, ProviderError};
use crate::domain::RawBar;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Deterministic random-walk provider.
#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    /// Generate weekday bars over `[start, end)`.
    pub fn generate(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = 100.0_f64;
        let mut current = start;

        while current < end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(RawBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
                adj_close: close,
            });

            price = close;
            current += chrono::Duration::days(1);
        }

        bars
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, ProviderError> {
        if symbol.trim().is_empty() {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = Self::generate(symbol, start, end);
        if bars.is_empty() {
            return Err(ProviderError::EmptyResponse {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
