//! PriceCast Core: domain types, data acquisition, cleaning and forecasting.
//!
//! This crate contains the forecasting pipeline's building blocks:
//! - Domain types (raw provider bars, price records, datasets, forecasts)
//! - Price providers (Yahoo Finance, deterministic synthetic) behind a trait
//! - Single-symbol CSV dataset store with atomic overwrite
//! - Cleaning stage producing a strictly typed, date-ordered series
//! - ARIMA(p,d,q) estimation and point forecasting

pub mod data;
pub mod domain;
pub mod model;
