//! Cleaning and validation: stored CSV into a typed, date-indexed series.
//!
//! Steps, in order:
//! 1. read every column as text
//! 2. locate `date` and `close` by case-insensitive name
//! 3. parse dates with the exact format `%Y-%m-%d`, rejecting bad rows
//! 4. trim surrounding whitespace from `close` and coerce it to `f64`
//!    (failures become null)
//! 5. drop rows whose close is null, non-finite or negative
//! 6. stable sort by date, keeping the last occurrence of a repeated date
//!
//! No interpolation and no forward fill. An empty result is valid.

use crate::data::store::DatasetStore;
use crate::domain::{Dataset, PriceRecord};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("dataset not found: {0}")]
    NotFound(PathBuf),

    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("dataset {path} is unreadable: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub bad_dates: usize,
    pub bad_closes: usize,
    pub duplicate_dates: usize,
    pub rows_kept: usize,
}

impl CleaningReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataset {
    pub dataset: Dataset,
    pub report: CleaningReport,
}

/// Load and clean the dataset stored at `path`.
///
/// The symbol label is the file stem.
pub fn clean_dataset(path: &Path) -> Result<CleanedDataset, SchemaError> {
    if !path.is_file() {
        return Err(SchemaError::NotFound(path.to_path_buf()));
    }
    let df = DatasetStore::new(path)
        .read_frame()
        .map_err(|e| SchemaError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let cleaned = clean_frame(df, &symbol)?;
    let r = &cleaned.report;
    info!(
        path = %path.display(),
        symbol = %symbol,
        rows_read = r.rows_read,
        bad_dates = r.bad_dates,
        bad_closes = r.bad_closes,
        duplicates = r.duplicate_dates,
        rows = r.rows_kept,
        "dataset cleaned"
    );
    Ok(cleaned)
}

/// Clean an all-text frame with `date` and `close` columns.
pub fn clean_frame(df: DataFrame, symbol: &str) -> Result<CleanedDataset, SchemaError> {
    let date_col = resolve_column(&df, "date")?;
    let close_col = resolve_column(&df, "close")?;
    let rows_read = df.height();

    let typed = df
        .lazy()
        .select([
            col(date_col.as_str())
                .cast(DataType::String)
                .str()
                .to_date(StrptimeOptions {
                    format: Some(DATE_FORMAT.into()),
                    strict: false,
                    exact: true,
                    cache: true,
                    ..Default::default()
                })
                .alias("date"),
            col(close_col.as_str())
                .cast(DataType::String)
                .str()
                .strip_chars(lit(NULL))
                .cast(DataType::Float64)
                .alias("close"),
        ])
        .collect()?;

    let dated = typed.lazy().filter(col("date").is_not_null()).collect()?;
    let bad_dates = rows_read - dated.height();

    // NaN and +inf fail the upper bound, -inf the lower.
    let valid = dated
        .lazy()
        .filter(
            col("close")
                .is_not_null()
                .and(col("close").gt_eq(lit(0.0)))
                .and(col("close").lt(lit(f64::INFINITY))),
        )
        .collect()?;
    let bad_closes = rows_read - bad_dates - valid.height();

    let valid_rows = valid.height();
    let deduped = valid
        .lazy()
        .sort(
            ["date"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(Some(vec!["date".into()]), UniqueKeepStrategy::Last)
        .collect()?;
    let duplicate_dates = valid_rows - deduped.height();

    let records = frame_to_records(&deduped)?;
    debug!(symbol, rows = records.len(), "records extracted");

    let report = CleaningReport {
        rows_read,
        bad_dates,
        bad_closes,
        duplicate_dates,
        rows_kept: records.len(),
    };
    Ok(CleanedDataset {
        dataset: Dataset::new(symbol, records),
        report,
    })
}

/// Exact lowercase match first, then any case.
fn resolve_column(df: &DataFrame, wanted: &str) -> Result<String, SchemaError> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    names
        .iter()
        .find(|n| n.as_str() == wanted)
        .or_else(|| names.iter().find(|n| n.trim().eq_ignore_ascii_case(wanted)))
        .cloned()
        .ok_or_else(|| SchemaError::MissingColumn(wanted.to_string()))
}

fn frame_to_records(df: &DataFrame) -> Result<Vec<PriceRecord>, SchemaError> {
    let dates = df.column("date")?.date()?;
    let closes = df.column("close")?.f64()?;
    let epoch = NaiveDate::default();

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        // Both columns were filtered for nulls above.
        let (Some(days), Some(close)) = (dates.get(i), closes.get(i)) else {
            continue;
        };
        records.push(PriceRecord {
            date: epoch + chrono::Duration::days(days as i64),
            close,
        });
    }
    Ok(records)
}
