//! Yahoo Finance price provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataSource, FetchResult, PriceProvider, ProviderError, ProviderSettings};
use crate::domain::RawBar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(
        settings: &ProviderSettings,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: settings.max_retries,
            base_delay: settings.base_delay(),
        })
    }

    /// Chart API URL for `[start, end)`: `period2` is midnight UTC of `end`.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let end_ts = end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    /// Parse the chart API response into RawBars within `[start, end)`.
    fn parse_response(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        resp: ChartResponse,
    ) -> Result<Vec<RawBar>, ProviderError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    ProviderError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    ProviderError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    ))
                }
            } else {
                ProviderError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ResponseFormatChanged("result array is empty".into()))?;

        let gmtoffset = data.meta.as_ref().and_then(|m| m.gmtoffset).unwrap_or(0);

        // Yahoo omits `timestamp` entirely when the range holds no sessions.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    ProviderError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            if date < start || date >= end {
                continue;
            }

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            // Skip rows where all OHLCV are None (holidays / non-trading days)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
                adj_close: adj_close.unwrap_or(f64::NAN),
            });
        }

        if bars.is_empty() {
            return Err(ProviderError::EmptyResponse {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }

        Ok(bars)
    }

    /// Execute the HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawBar>, ProviderError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(ProviderError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, ?delay, "retrying provider request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(ProviderError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(ProviderError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, retry_after, "provider rate limited");
                        last_error = Some(ProviderError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(ProviderError::AuthenticationRequired(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ProviderError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error =
                            Some(ProviderError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        ProviderError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    let bars = Self::parse_response(symbol, start, end, chart)?;
                    self.circuit_breaker.record_success();
                    return Ok(bars);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(ProviderError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(ProviderError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, ProviderError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn parse(json: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>, ProviderError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("AAPL", start, end, resp)
    }

    // 2024-01-02 and 2024-01-03 14:30 UTC session opens, plus a holiday row.
    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, 184.22, null],
                        "high":   [188.44, 185.88, null],
                        "low":    [183.89, 183.43, null],
                        "close":  [185.64, null, null],
                        "volume": [82488700, 58414500, null]
                    }],
                    "adjclose": [{"adjclose": [184.29, null, null]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_and_keeps_missing_close_as_nan() {
        let bars = parse(SAMPLE, d(2024, 1, 1), d(2024, 2, 1)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[0].volume, 82_488_700);
        assert_eq!(bars[1].date, d(2024, 1, 3));
        assert!(bars[1].close.is_nan());
    }

    #[test]
    fn end_date_is_exclusive() {
        let bars = parse(SAMPLE, d(2024, 1, 1), d(2024, 1, 3)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, d(2024, 1, 2));
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse(json, d(2024, 1, 1), d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, ProviderError::SymbolNotFound { .. }));
    }

    #[test]
    fn missing_timestamps_is_empty_response() {
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[],"volume":[]}]}}],"error":null}}"#;
        let err = parse(json, d(2024, 1, 1), d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { .. }));
    }

    #[test]
    fn chart_url_uses_midnight_bounds() {
        let url = YahooProvider::chart_url("AAPL", d(2024, 1, 1), d(2024, 1, 2));
        assert!(url.contains("/chart/AAPL?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704153600"));
    }
}
