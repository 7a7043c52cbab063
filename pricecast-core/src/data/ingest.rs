//! Ingestion adapter: provider history into the dataset store.

use crate::data::provider::{PriceProvider, ProviderError};
use crate::data::store::{DatasetStore, StoreError};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// What a successful ingestion wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub symbol: String,
    pub path: PathBuf,
    pub rows: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub provider: String,
}

/// Fetch daily history for `symbol` over `[start, end)` and overwrite the
/// store with it.
///
/// The previous dataset at the store path is deleted before the fetch, so a
/// failed ingestion leaves no file behind rather than stale data. A provider
/// that reports itself unavailable is not called.
///
/// Failures are returned, not logged; the caller reports them.
pub fn ingest(
    provider: &dyn PriceProvider,
    store: &DatasetStore,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<IngestSummary, IngestError> {
    if start > end {
        return Err(IngestError::InvalidRange { start, end });
    }

    store.remove()?;

    if !provider.is_available() {
        warn!(symbol, provider = provider.name(), "provider unavailable, skipping fetch");
        return Err(ProviderError::CircuitBreakerTripped.into());
    }

    let fetched = provider.fetch(symbol, start, end)?;

    let fetched_rows = fetched.bars.len();
    let bars: Vec<_> = fetched
        .bars
        .into_iter()
        .filter(|b| b.date >= start && b.date < end)
        .collect();
    if bars.len() < fetched_rows {
        warn!(
            symbol,
            discarded = fetched_rows - bars.len(),
            "provider returned rows outside the requested range"
        );
    }
    if bars.is_empty() {
        return Err(ProviderError::EmptyResponse {
            symbol: symbol.to_string(),
            start,
            end,
        }
        .into());
    }

    let meta = match store.write_bars(symbol, &bars, fetched.source.as_str()) {
        Ok(meta) => meta,
        Err(e) => {
            let _ = store.remove();
            return Err(e.into());
        }
    };

    info!(
        symbol,
        path = %store.path().display(),
        rows = meta.row_count,
        first = %meta.start_date,
        last = %meta.end_date,
        provider = provider.name(),
        "ingested"
    );

    Ok(IngestSummary {
        symbol: symbol.to_string(),
        path: store.path().to_path_buf(),
        rows: meta.row_count,
        first_date: meta.start_date,
        last_date: meta.end_date,
        provider: provider.name().to_string(),
    })
}
