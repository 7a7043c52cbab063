//! Forecast engine properties on cleaned datasets.

use chrono::NaiveDate;
use pricecast_core::domain::{Dataset, PriceRecord};
use pricecast_core::model::linalg::is_stationary;
use pricecast_core::model::{
    forecast_dataset, Arima, ArimaOrder, FittedModel, ForecastModel, ModelFitError,
};
use proptest::prelude::*;

fn dataset(closes: &[f64]) -> Dataset {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let records = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceRecord {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect();
    Dataset::new("TEST", records)
}

/// Random walk from 100 with a small periodic wobble so no window is flat.
fn walk(steps: &[f64]) -> Vec<f64> {
    let mut level = 100.0;
    steps
        .iter()
        .enumerate()
        .map(|(i, s)| {
            level += s + 0.01 * (i % 3) as f64;
            level
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Exactly H finite values for any H >= 1 and any series of at least
    /// p + d + 1 observations.
    #[test]
    fn forecast_has_exactly_horizon_values(
        steps in prop::collection::vec(-2.0..2.0_f64, 7..120),
        horizon in 1usize..60,
    ) {
        let ds = dataset(&walk(&steps));
        let fc = forecast_dataset(&ds, ArimaOrder::default(), horizon).unwrap();

        prop_assert_eq!(fc.horizon(), horizon);
        prop_assert!(fc.values().iter().all(|v| v.is_finite()));
        for (i, point) in fc.points.iter().enumerate() {
            prop_assert_eq!(point.step, i + 1);
        }
    }

    /// GIVEN a short bounded series and an ARMA order
    /// WHEN the model is fitted
    /// THEN it is either rejected or stationary, invertible and bounded.
    #[test]
    fn short_arma_fits_are_stable_or_rejected(
        closes in prop::collection::vec(10.0..14.0_f64, 8..16),
    ) {
        let ds = dataset(&closes);
        match Arima::new(ArimaOrder::new(2, 1, 2)).fit(&ds) {
            Ok(fitted) => {
                let summary = fitted.summary();
                prop_assert!(is_stationary(&summary.ar));
                let negated: Vec<f64> = summary.ma.iter().map(|t| -t).collect();
                prop_assert!(is_stationary(&negated));

                let fc = fitted.forecast(30).unwrap();
                prop_assert!(fc.values().iter().all(|v| v.is_finite() && v.abs() < 1e6));
            }
            Err(e) => prop_assert!(matches!(
                e,
                ModelFitError::NonStationary(_)
                    | ModelFitError::Singular(_)
                    | ModelFitError::ZeroVariance
            )),
        }
    }
}

#[test]
fn straight_line_is_zero_variance_after_differencing() {
    // GIVEN closes rising by exactly one per day
    let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();

    // WHEN the default model is fitted
    let err = forecast_dataset(&dataset(&closes), ArimaOrder::default(), 30).unwrap_err();

    // THEN the flat differenced series is reported, not a degenerate forecast
    assert_eq!(err, ModelFitError::ZeroVariance);
}

#[test]
fn eleven_bounded_observations_never_explode() {
    let closes = [12.0, 10.0, 14.0, 11.0, 13.0, 10.0, 14.0, 12.0, 11.0, 13.0, 12.0];
    match forecast_dataset(&dataset(&closes), ArimaOrder::new(2, 1, 2), 30) {
        Ok(fc) => assert!(fc.values().iter().all(|v| (v - 12.0).abs() < 1e4)),
        Err(e) => assert!(matches!(
            e,
            ModelFitError::NonStationary(_) | ModelFitError::Singular(_)
        )),
    }
}

#[test]
fn six_observations_are_not_enough_for_default_order() {
    let ds = dataset(&[1.0, 2.0, 1.5, 2.5, 2.0, 3.0]);
    assert_eq!(
        forecast_dataset(&ds, ArimaOrder::default(), 30).unwrap_err(),
        ModelFitError::InsufficientData {
            required: 7,
            actual: 6
        }
    );
}

#[test]
fn empty_dataset_is_insufficient() {
    let ds = dataset(&[]);
    assert!(matches!(
        forecast_dataset(&ds, ArimaOrder::default(), 30),
        Err(ModelFitError::InsufficientData { actual: 0, .. })
    ));
}

#[test]
fn constant_series_is_rejected() {
    let ds = dataset(&[150.0; 300]);
    assert_eq!(
        forecast_dataset(&ds, ArimaOrder::default(), 30).unwrap_err(),
        ModelFitError::ZeroVariance
    );
}

#[test]
fn fit_summary_reports_estimates() {
    let steps: Vec<f64> = (0..500).map(|i| ((i * 7919) % 101) as f64 / 50.0 - 1.0).collect();
    let ds = dataset(&walk(&steps));

    let model = Arima::new(ArimaOrder::default());
    assert_eq!(model.name(), "ARIMA(5,1,0)");
    let fitted = model.fit(&ds).unwrap();
    let summary = fitted.summary();

    assert_eq!(summary.ar.len(), 5);
    assert!(summary.ma.is_empty());
    assert!(summary.mean.is_none());
    assert_eq!(summary.n_obs, 500);
    assert!(summary.sigma2 > 0.0);
    assert!(summary.log_likelihood.is_finite());
}

#[test]
fn repeated_runs_are_identical() {
    let steps: Vec<f64> = (0..800).map(|i| ((i * 31) % 17) as f64 / 8.0 - 1.0).collect();
    let ds = dataset(&walk(&steps));

    let a = forecast_dataset(&ds, ArimaOrder::default(), 30).unwrap();
    let b = forecast_dataset(&ds, ArimaOrder::default(), 30).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.model, "ARIMA(5,1,0)");
}

#[test]
fn failure_does_not_poison_later_fits() {
    let model = Arima::new(ArimaOrder::default());
    assert!(model.fit(&dataset(&[1.0; 10])).is_err());

    let ds = dataset(&walk(&[0.5, -0.2, 0.3, 0.1, -0.4, 0.6, 0.2, -0.1, 0.3, 0.4]));
    let fc = model.fit(&ds).unwrap().forecast(5).unwrap();
    assert_eq!(fc.horizon(), 5);
}
