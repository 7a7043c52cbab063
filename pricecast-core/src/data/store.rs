//! CSV dataset store for a single symbol.
//!
//! Layout: one CSV file per dataset path plus a metadata sidecar
//! `{path}.meta.json` (symbol, date range, row count, content hash, provider).
//!
//! - Writes are atomic (write to `{path}.tmp`, rename into place)
//! - The store holds at most one version per path; ingestion removes the
//!   previous file before fetching, never merges
//! - Reads return every column as text; typing is the cleaning stage's job

use crate::domain::{Dataset, RawBar};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the dataset store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset encoding error: {0}")]
    Frame(#[from] PolarsError),

    #[error("metadata error: {0}")]
    Meta(String),

    #[error("refusing to write an empty dataset to {0}")]
    Empty(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Metadata sidecar for a stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_count: usize,
    /// BLAKE3 hash of the CSV bytes.
    pub data_hash: String,
    pub provider: String,
    pub written_at: chrono::NaiveDateTime,
}

/// On-disk home of one symbol's price history.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the dataset CSV.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the metadata sidecar: `{path}.meta.json`.
    pub fn meta_path(&self) -> PathBuf {
        self.with_suffix(".meta.json")
    }

    fn tmp_path(&self) -> PathBuf {
        self.with_suffix(".tmp")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Delete the dataset and its sidecar. Returns true if a dataset existed.
    pub fn remove(&self) -> Result<bool, StoreError> {
        let existed = self.exists();
        if existed {
            fs::remove_file(&self.path).map_err(io_err(&self.path))?;
            info!(path = %self.path.display(), "deleted previous dataset");
        }
        let meta = self.meta_path();
        if meta.is_file() {
            fs::remove_file(&meta).map_err(io_err(&meta))?;
        }
        Ok(existed)
    }

    /// Write provider bars as `date,open,high,low,close,volume,adj_close`.
    ///
    /// Missing provider prices (`NaN`) are written as empty fields.
    pub fn write_bars(
        &self,
        symbol: &str,
        bars: &[RawBar],
        provider: &str,
    ) -> Result<DatasetMeta, StoreError> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => return Err(StoreError::Empty(self.path.clone())),
        };
        let mut df = bars_to_frame(bars)?;
        self.write_frame(&mut df)?;
        self.write_meta(symbol, first, last, bars.len(), provider)
    }

    /// Write a cleaned dataset as `date,close`.
    pub fn write_dataset(&self, dataset: &Dataset) -> Result<DatasetMeta, StoreError> {
        let (first, last) = match (dataset.first_date(), dataset.last_date()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(StoreError::Empty(self.path.clone())),
        };
        let dates: Vec<i32> = dataset.records.iter().map(|r| days_since_epoch(r.date)).collect();
        let closes: Vec<f64> = dataset.records.iter().map(|r| r.close).collect();
        let mut df = DataFrame::new(vec![
            Column::new("date".into(), dates).cast(&DataType::Date)?,
            Column::new("close".into(), closes),
        ])?;
        self.write_frame(&mut df)?;
        self.write_meta(&dataset.symbol, first, last, dataset.len(), "cleaned")
    }

    /// Read the stored CSV with every column as text.
    ///
    /// Short rows are padded with nulls so a stray truncated line does not
    /// abort the whole read.
    pub fn read_frame(&self) -> Result<DataFrame, StoreError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;
        debug!(path = %self.path.display(), rows = df.height(), "read dataset frame");
        Ok(df)
    }

    /// Load the sidecar, if present and parseable.
    pub fn read_meta(&self) -> Option<DatasetMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_frame(&self, df: &mut DataFrame) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let tmp = self.tmp_path();
        let written = fs::File::create(&tmp)
            .map_err(io_err(&tmp))
            .and_then(|mut file| {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(df)
                    .map_err(StoreError::from)
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        info!(path = %self.path.display(), rows = df.height(), "dataset written");
        Ok(())
    }

    fn write_meta(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        row_count: usize,
        provider: &str,
    ) -> Result<DatasetMeta, StoreError> {
        let bytes = fs::read(&self.path).map_err(io_err(&self.path))?;
        let meta = DatasetMeta {
            symbol: symbol.to_string(),
            start_date,
            end_date,
            row_count,
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
            provider: provider.to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Meta(format!("meta serialization: {e}")))?;
        let meta_path = self.meta_path();
        fs::write(&meta_path, json).map_err(io_err(&meta_path))?;
        Ok(meta)
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn finite_or_null(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Convert provider bars to a DataFrame with an explicit `date` column.
fn bars_to_frame(bars: &[RawBar]) -> Result<DataFrame, StoreError> {
    let dates: Vec<i32> = bars.iter().map(|b| days_since_epoch(b.date)).collect();
    let opens: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.open)).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.high)).collect();
    let lows: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.low)).collect();
    let closes: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.close)).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();
    let adj_closes: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.adj_close)).collect();

    Ok(DataFrame::new(vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("adj_close".into(), adj_closes),
    ])?)
}
