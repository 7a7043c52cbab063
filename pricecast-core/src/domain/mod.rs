//! Domain types for PriceCast

pub mod forecast;
pub mod record;

pub use forecast::{ForecastPoint, ForecastResult};
pub use record::{Dataset, PriceRecord, RawBar};

