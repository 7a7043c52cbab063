//! Price records: the market data units the pipeline moves around.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw daily OHLCV row from a data provider (before cleaning).
///
/// Missing provider prices are carried as `NaN`, missing volume as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

/// One calendar date, one closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered price history for one symbol.
///
/// A `Dataset` returned by the cleaning stage has unique dates in ascending
/// order and a finite, non-negative `close` on every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub symbol: String,
    pub records: Vec<PriceRecord>,
}

impl Dataset {
    pub fn new(symbol: impl Into<String>, records: Vec<PriceRecord>) -> Self {
        Self {
            symbol: symbol.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Checks the cleaned-dataset invariants: strictly ascending dates and
    /// finite non-negative closes.
    pub fn is_canonical(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| w[0].date < w[1].date)
            && self
                .records
                .iter()
                .all(|r| r.close.is_finite() && r.close >= 0.0)
    }
}
