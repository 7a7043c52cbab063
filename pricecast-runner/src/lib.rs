//! PriceCast Runner: pipeline configuration and orchestration.

pub mod config;
pub mod pipeline;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{run_pipeline, DatasetRenderer, ForecastOutcome, PipelineReport};
