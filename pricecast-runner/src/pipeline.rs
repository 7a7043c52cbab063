//! Sequential pipeline: ingest, clean, then render and forecast.
//!
//! Each stage's outcome is captured at its own boundary and returned in a
//! [`PipelineReport`]. A failed stage never aborts the stages that already
//! have the data they need:
//! - ingestion failure: cleaning still runs against the dataset path
//! - cleaning failure: rendering and forecasting are skipped
//! - forecast failure: rendering is unaffected
//!
//! Stage errors are logged here, once, with the symbol and dataset path.

use crate::config::PipelineConfig;
use pricecast_core::data::{
    clean_dataset, ingest, CleanedDataset, DatasetStore, IngestError, IngestSummary,
    PriceProvider, SchemaError,
};
use pricecast_core::domain::{Dataset, ForecastResult};
use pricecast_core::model::{Arima, FitSummary, FittedModel, ForecastModel, ModelFitError};
use tracing::{error, info, warn};

/// Consumer of the cleaned dataset, e.g. a chart writer.
pub trait DatasetRenderer {
    fn render(&self, dataset: &Dataset) -> anyhow::Result<()>;
}

/// A successful forecast together with the fit it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastOutcome {
    pub forecast: ForecastResult,
    pub fit: FitSummary,
}

/// Per-stage outcomes of one run.
#[derive(Debug)]
pub struct PipelineReport {
    pub ingest: Result<IngestSummary, IngestError>,
    pub clean: Result<CleanedDataset, SchemaError>,
    /// `None` when no renderer was supplied or cleaning failed.
    pub render: Option<anyhow::Result<()>>,
    /// `None` when cleaning failed.
    pub forecast: Option<Result<ForecastOutcome, ModelFitError>>,
}

impl PipelineReport {
    /// True when every stage that ran succeeded.
    pub fn is_success(&self) -> bool {
        self.ingest.is_ok()
            && self.clean.is_ok()
            && self.render.as_ref().map_or(true, |r| r.is_ok())
            && matches!(self.forecast, Some(Ok(_)))
    }

    pub fn forecast_result(&self) -> Option<&ForecastResult> {
        match &self.forecast {
            Some(Ok(outcome)) => Some(&outcome.forecast),
            _ => None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.clean.as_ref().ok().map(|c| &c.dataset)
    }
}

/// Run ingestion, cleaning, rendering and forecasting in order.
pub fn run_pipeline(
    config: &PipelineConfig,
    provider: &dyn PriceProvider,
    renderer: Option<&dyn DatasetRenderer>,
) -> PipelineReport {
    let symbol = config.symbol.as_str();
    let path = config.dataset.as_path();
    info!(
        symbol,
        path = %path.display(),
        start = %config.start,
        end = %config.end,
        provider = provider.name(),
        "pipeline started"
    );

    let store = DatasetStore::new(path);
    let ingest_outcome = ingest(provider, &store, symbol, config.start, config.end);
    if let Err(e) = &ingest_outcome {
        error!(symbol, path = %path.display(), error = %e, "ingestion failed");
    }

    // Label with the configured symbol, not the file stem.
    let mut clean_outcome = clean_dataset(path);
    if let Ok(cleaned) = &mut clean_outcome {
        cleaned.dataset.symbol = config.symbol.clone();
    }
    let dataset = match &clean_outcome {
        Ok(cleaned) => &cleaned.dataset,
        Err(e) => {
            error!(
                symbol,
                path = %path.display(),
                error = %e,
                "cleaning failed, skipping downstream stages"
            );
            return PipelineReport {
                ingest: ingest_outcome,
                clean: clean_outcome,
                render: None,
                forecast: None,
            };
        }
    };

    let render_outcome = renderer.map(|r| {
        let outcome = r.render(dataset);
        if let Err(e) = &outcome {
            warn!(symbol, error = %e, "rendering failed");
        }
        outcome
    });

    let forecast_outcome = run_forecast(config, dataset);
    match &forecast_outcome {
        Ok(outcome) => info!(
            symbol,
            model = %outcome.forecast.model,
            horizon = outcome.forecast.horizon(),
            sigma2 = outcome.fit.sigma2,
            "forecast complete"
        ),
        Err(e) => error!(
            symbol,
            path = %path.display(),
            rows = dataset.len(),
            error = %e,
            "forecast failed"
        ),
    }

    PipelineReport {
        ingest: ingest_outcome,
        clean: clean_outcome,
        render: render_outcome,
        forecast: Some(forecast_outcome),
    }
}

fn run_forecast(
    config: &PipelineConfig,
    dataset: &Dataset,
) -> Result<ForecastOutcome, ModelFitError> {
    if config.horizon == 0 {
        return Err(ModelFitError::InvalidHorizon);
    }
    let fitted = Arima::new(config.order).fit(dataset)?;
    let forecast = fitted.forecast(config.horizon)?;
    Ok(ForecastOutcome {
        forecast,
        fit: fitted.summary().clone(),
    })
}
