//! Data acquisition, storage and cleaning

pub mod circuit_breaker;
pub mod clean;
pub mod ingest;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use clean::{clean_dataset, clean_frame, CleanedDataset, CleaningReport, SchemaError};
pub use ingest::{ingest, IngestError, IngestSummary};
pub use provider::{DataSource, FetchResult, PriceProvider, ProviderError, ProviderSettings};
pub use store::{DatasetMeta, DatasetStore, StoreError};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
