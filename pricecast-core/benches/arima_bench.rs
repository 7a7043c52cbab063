//! Criterion benchmarks for the forecasting hot paths.
//!
//! Benchmarks:
//! 1. ARIMA(5,1,0) fit over typical history lengths
//! 2. 30-step forecast from a fitted model
//! 3. Cleaning a ten-year CSV

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pricecast_core::data::{clean_dataset, DatasetStore, SyntheticProvider};
use pricecast_core::domain::{Dataset, PriceRecord};
use pricecast_core::model::{Arima, ArimaOrder, FittedModel, ForecastModel};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_dataset(n: usize) -> Dataset {
    let base_date = NaiveDate::from_ymd_opt(2010, 1, 4).unwrap();
    let records = (0..n)
        .map(|i| PriceRecord {
            date: base_date + chrono::Duration::days(i as i64),
            close: 100.0 + (i as f64 * 0.1).sin() * 10.0 + i as f64 * 0.02,
        })
        .collect();
    Dataset::new("BENCH", records)
}

// ── 1. Fit ───────────────────────────────────────────────────────────

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("arima_fit");
    let model = Arima::new(ArimaOrder::default());

    for n in [250, 1_000, 3_500] {
        let ds = make_dataset(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &ds, |b, ds| {
            b.iter(|| model.fit(black_box(ds)))
        });
    }
    group.finish();
}

// ── 2. Forecast ──────────────────────────────────────────────────────

fn bench_forecast(c: &mut Criterion) {
    let fitted = Arima::new(ArimaOrder::default())
        .fit(&make_dataset(3_500))
        .unwrap();
    c.bench_function("arima_forecast_30", |b| {
        b.iter(|| fitted.forecast(black_box(30)))
    });
}

// ── 3. Cleaning ──────────────────────────────────────────────────────

fn bench_clean(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("bench.csv"));
    let bars = SyntheticProvider::generate(
        "BENCH",
        NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
    );
    store.write_bars("BENCH", &bars, "synthetic").unwrap();

    c.bench_function("clean_ten_year_csv", |b| {
        b.iter(|| clean_dataset(black_box(store.path())))
    });
}

criterion_group!(benches, bench_fit, bench_forecast, bench_clean);
criterion_main!(benches);
