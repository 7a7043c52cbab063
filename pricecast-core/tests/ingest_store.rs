//! Ingestion adapter + dataset store integration.

use chrono::NaiveDate;
use pricecast_core::data::{
    clean_dataset, ingest, DataSource, DatasetStore, FetchResult, IngestError, PriceProvider,
    ProviderError, SyntheticProvider,
};
use pricecast_core::domain::RawBar;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bar(date: NaiveDate, close: f64) -> RawBar {
    RawBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000,
        adj_close: close,
    }
}

/// Returns a fixed set of bars, or a fixed error.
struct ScriptedProvider {
    result: Result<Vec<RawBar>, fn() -> ProviderError>,
}

impl PriceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, ProviderError> {
        match &self.result {
            Ok(bars) => Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: bars.clone(),
                source: DataSource::Synthetic,
            }),
            Err(make) => Err(make()),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[test]
fn store_holds_exactly_the_provider_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("aapl_stock_data.csv"));
    let start = date(2023, 1, 1);
    let end = date(2023, 3, 1);

    let summary = ingest(&SyntheticProvider::new(), &store, "AAPL", start, end).unwrap();
    let expected = SyntheticProvider::generate("AAPL", start, end);

    assert_eq!(summary.rows, expected.len());
    assert_eq!(store.read_frame().unwrap().height(), expected.len());

    let cleaned = clean_dataset(store.path()).unwrap();
    let expected_closes: Vec<f64> = expected.iter().map(|b| b.close).collect();
    assert_eq!(cleaned.dataset.len(), expected.len());
    for (got, want) in cleaned.dataset.closes().iter().zip(&expected_closes) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
}

#[test]
fn second_ingestion_replaces_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("x.csv"));

    // GIVEN: dataset A is ingested
    let a = ScriptedProvider {
        result: Ok(vec![
            bar(date(2024, 1, 2), 10.0),
            bar(date(2024, 1, 3), 11.0),
            bar(date(2024, 1, 4), 12.0),
        ]),
    };
    ingest(&a, &store, "X", date(2024, 1, 1), date(2024, 2, 1)).unwrap();

    // WHEN: dataset B is ingested to the same path
    let b = ScriptedProvider {
        result: Ok(vec![bar(date(2024, 1, 8), 50.0), bar(date(2024, 1, 9), 51.0)]),
    };
    ingest(&b, &store, "X", date(2024, 1, 1), date(2024, 2, 1)).unwrap();

    // THEN: reading yields B only, no rows from A survive
    let cleaned = clean_dataset(store.path()).unwrap();
    assert_eq!(cleaned.dataset.closes(), vec![50.0, 51.0]);
    assert_eq!(cleaned.dataset.first_date(), Some(date(2024, 1, 8)));
    assert_eq!(store.read_meta().unwrap().row_count, 2);
}

#[test]
fn failed_ingestion_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("x.csv"));

    let ok = ScriptedProvider {
        result: Ok(vec![bar(date(2024, 1, 2), 10.0)]),
    };
    ingest(&ok, &store, "X", date(2024, 1, 1), date(2024, 2, 1)).unwrap();
    assert!(store.exists());

    let failing = ScriptedProvider {
        result: Err(|| ProviderError::NetworkUnreachable("connection refused".into())),
    };
    let err = ingest(&failing, &store, "X", date(2024, 1, 1), date(2024, 2, 1)).unwrap_err();

    assert!(matches!(
        err,
        IngestError::Provider(ProviderError::NetworkUnreachable(_))
    ));
    assert!(!store.exists(), "stale dataset must not survive a failed fetch");
    assert!(!store.meta_path().exists());
}

#[test]
fn unknown_symbol_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("x.csv"));
    let provider = ScriptedProvider {
        result: Err(|| ProviderError::SymbolNotFound {
            symbol: "NOPE".into(),
        }),
    };
    let err = ingest(&provider, &store, "NOPE", date(2024, 1, 1), date(2024, 2, 1)).unwrap_err();
    assert!(err.to_string().contains("NOPE"));
    assert!(!store.exists());
}

#[test]
fn meta_hash_tracks_file_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("x.csv"));
    let provider = SyntheticProvider::new();

    ingest(&provider, &store, "AAA", date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    let first = store.read_meta().unwrap();
    ingest(&provider, &store, "AAA", date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    let again = store.read_meta().unwrap();
    ingest(&provider, &store, "BBB", date(2024, 1, 1), date(2024, 3, 1)).unwrap();
    let other = store.read_meta().unwrap();

    assert_eq!(first.data_hash, again.data_hash);
    assert_ne!(first.data_hash, other.data_hash);
    assert_eq!(other.symbol, "BBB");
    assert_eq!(other.provider, "synthetic");
}
