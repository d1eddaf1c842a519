use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::Symbol;

const ORIGIN: &str = "yahoo";
const REFERER: &str = "https://finance.yahoo.com/";
const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_ENDPOINT: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Lookback range requested from the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackWindow {
    OneDay,
    FiveDays,
    OneMonth,
}

impl LookbackWindow {
    /// Shortest window first.
    pub const ALL: [Self; 3] = [Self::OneDay, Self::FiveDays, Self::OneMonth];

    pub const fn as_range(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
        }
    }
}

impl Display for LookbackWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_range())
    }
}

/// Metadata field a fallback price was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    CurrentPrice,
    RegularMarketPrice,
}

impl MetadataField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentPrice => "currentPrice",
            Self::RegularMarketPrice => "regularMarketPrice",
        }
    }
}

// ============================================================================
// Crumb handling
// ============================================================================

#[derive(Debug, Default)]
struct CrumbState {
    crumb: Option<String>,
    refreshed_at: Option<Instant>,
}

/// Caches the session crumb the quoteSummary endpoint requires.
///
/// The session cookie itself lives in the transport's cookie jar; it is set by
/// visiting `fc.yahoo.com` before asking for a crumb.
#[derive(Debug)]
pub struct YahooAuthManager {
    state: Mutex<CrumbState>,
    ttl: Duration,
}

impl Default for YahooAuthManager {
    fn default() -> Self {
        Self {
            state: Mutex::new(CrumbState::default()),
            ttl: Duration::from_secs(3600),
        }
    }
}

impl YahooAuthManager {
    fn cached(&self) -> Option<String> {
        let state = self.state.lock().expect("crumb state is not poisoned");
        match (&state.crumb, state.refreshed_at) {
            (Some(crumb), Some(at)) if at.elapsed() < self.ttl => Some(crumb.clone()),
            _ => None,
        }
    }

    /// Returns the cached crumb, fetching a fresh one when missing or expired.
    pub async fn crumb(&self, http_client: &dyn HttpClient) -> Result<String, FetchError> {
        if let Some(crumb) = self.cached() {
            return Ok(crumb);
        }

        let cookie_request = HttpRequest::get("https://fc.yahoo.com")
            .with_header("referer", REFERER)
            .with_timeout_ms(DEFAULT_TIMEOUT_MS);
        // fc.yahoo.com answers 404 but still sets the session cookie.
        let _ = http_client.execute(cookie_request).await;

        for endpoint in [
            "https://query1.finance.yahoo.com/v1/test/getcrumb",
            "https://query2.finance.yahoo.com/v1/test/getcrumb",
        ] {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_timeout_ms(DEFAULT_TIMEOUT_MS);

            let Ok(response) = http_client.execute(request).await else {
                continue;
            };
            let body = response.body.trim();
            if !response.is_success() || body.is_empty() {
                continue;
            }
            if body.to_ascii_lowercase().contains("too many requests") {
                return Err(FetchError::unavailable(ORIGIN, "rate limited while fetching crumb"));
            }
            if body.contains('<') || body.contains(' ') || body.len() >= 100 {
                continue;
            }

            self.store(body);
            return Ok(body.to_owned());
        }

        Err(FetchError::unavailable(ORIGIN, "failed to obtain crumb from all endpoints"))
    }

    fn store(&self, crumb: &str) {
        let mut state = self.state.lock().expect("crumb state is not poisoned");
        state.crumb = Some(crumb.to_owned());
        state.refreshed_at = Some(Instant::now());
    }

    /// Drops the cached crumb so the next call refreshes it.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("crumb state is not poisoned");
        *state = CrumbState::default();
    }
}

// ============================================================================
// Quote API client
// ============================================================================

/// Yahoo Finance quote API: chart time series and quote summary metadata.
#[derive(Clone)]
pub struct YahooQuoteApi {
    http_client: Arc<dyn HttpClient>,
    auth: Arc<YahooAuthManager>,
}

impl YahooQuoteApi {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth: Arc::new(YahooAuthManager::default()),
        }
    }

    /// Most recent close within `window`.
    pub async fn latest_close(
        &self,
        symbol: &Symbol,
        window: LookbackWindow,
    ) -> Result<f64, FetchError> {
        let chart = self.chart(symbol, window).await?;
        last_close(&chart)
            .ok_or_else(|| FetchError::no_data(ORIGIN, format!("empty {window} series for {symbol}")))
    }

    /// Single-shot quote: live market price, else the latest daily close.
    pub async fn quote_price(&self, symbol: &Symbol) -> Result<f64, FetchError> {
        let chart = self.chart(symbol, LookbackWindow::OneDay).await?;
        chart
            .meta
            .as_ref()
            .and_then(|meta| meta.regular_market_price)
            .filter(|price| price.is_finite() && *price > 0.0)
            .or_else(|| last_close(&chart))
            .ok_or_else(|| FetchError::no_data(ORIGIN, format!("no quote for {symbol}")))
    }

    /// Price from ticker metadata: `currentPrice`, then `regularMarketPrice`.
    pub async fn metadata_price(
        &self,
        symbol: &Symbol,
    ) -> Result<(f64, MetadataField), FetchError> {
        let crumb = self.auth.crumb(self.http_client.as_ref()).await?;
        let url = format!(
            "{SUMMARY_ENDPOINT}/{}?modules=financialData,price&crumb={}",
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(&crumb)
        );
        let body = self.get(&url).await.inspect_err(|_| self.auth.invalidate())?;

        let response: SummaryResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::no_data(ORIGIN, format!("unreadable quote summary: {e}")))?;
        if let Some(error) = response.quote_summary.error {
            return Err(FetchError::no_data(ORIGIN, error.to_string()));
        }

        let result = response
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::no_data(ORIGIN, format!("no summary for {symbol}")))?;

        let current = result
            .financial_data
            .and_then(|data| data.current_price)
            .and_then(RawValue::usable);
        if let Some(price) = current {
            return Ok((price, MetadataField::CurrentPrice));
        }

        result
            .price
            .and_then(|data| data.regular_market_price)
            .and_then(RawValue::usable)
            .map(|price| (price, MetadataField::RegularMarketPrice))
            .ok_or_else(|| FetchError::no_data(ORIGIN, format!("no price fields for {symbol}")))
    }

    async fn chart(&self, symbol: &Symbol, window: LookbackWindow) -> Result<ChartResult, FetchError> {
        let url = format!(
            "{CHART_ENDPOINT}/{}?range={}&interval=1d",
            urlencoding::encode(symbol.as_str()),
            window.as_range()
        );
        let body = self.get(&url).await?;

        let response: ChartResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::no_data(ORIGIN, format!("unreadable chart: {e}")))?;
        if let Some(error) = response.chart.error {
            return Err(FetchError::no_data(ORIGIN, error.to_string()));
        }

        response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::no_data(ORIGIN, format!("no chart result for {symbol}")))
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "requesting yahoo endpoint");
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout_ms(DEFAULT_TIMEOUT_MS);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| FetchError::unavailable(ORIGIN, format!("transport error: {}", e.message())))?;

        if !response.is_success() {
            return Err(FetchError::unavailable(
                ORIGIN,
                format!("returned status {}", response.status),
            ));
        }

        Ok(response.body)
    }
}

fn last_close(chart: &ChartResult) -> Option<f64> {
    chart
        .indicators
        .as_ref()?
        .quote
        .first()?
        .close
        .iter()
        .rev()
        .flatten()
        .copied()
        .find(|close| close.is_finite() && *close > 0.0)
}

// ============================================================================
// Response structures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "api error {}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryData,
}

#[derive(Debug, Clone, Deserialize)]
struct SummaryData {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct SummaryResult {
    #[serde(rename = "financialData", default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    price: Option<PriceData>,
}

#[derive(Debug, Clone, Deserialize)]
struct FinancialData {
    #[serde(rename = "currentPrice", default)]
    current_price: Option<RawValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct PriceData {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`.
#[derive(Debug, Clone, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawValue {
    fn usable(self) -> Option<f64> {
        self.raw.filter(|v| v.is_finite() && *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpError, HttpResponse};
    use std::future::Future;
    use std::pin::Pin;

    struct RoutedHttpClient {
        requests: Mutex<Vec<String>>,
    }

    impl RoutedHttpClient {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for RoutedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request log should not be poisoned")
                .push(request.url.clone());
            let url = request.url;
            Box::pin(async move {
                if url.contains("getcrumb") {
                    Ok(HttpResponse::ok("abcCRUMB"))
                } else if url.contains("quoteSummary") {
                    Ok(HttpResponse::ok(
                        r#"{"quoteSummary":{"result":[{"financialData":{"currentPrice":{}},"price":{"regularMarketPrice":{"raw":412.5,"fmt":"412.50"}}}],"error":null}}"#,
                    ))
                } else if url.contains("range=1d") {
                    Ok(HttpResponse::ok(
                        r#"{"chart":{"result":[{"meta":{"regularMarketPrice":null},"indicators":{"quote":[{"close":[188.1,189.9,null]}]}}],"error":null}}"#,
                    ))
                } else if url.contains("fc.yahoo.com") {
                    Ok(HttpResponse::with_status(404, ""))
                } else {
                    Err(HttpError::timeout("request timeout"))
                }
            })
        }
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").expect("valid symbol")
    }

    #[tokio::test]
    async fn latest_close_skips_trailing_nulls() {
        let api = YahooQuoteApi::new(Arc::new(RoutedHttpClient::new()));

        let price = api
            .latest_close(&aapl(), LookbackWindow::OneDay)
            .await
            .expect("close available");
        assert_eq!(price, 189.9);
    }

    #[tokio::test]
    async fn quote_price_falls_back_to_close_without_live_price() {
        let api = YahooQuoteApi::new(Arc::new(RoutedHttpClient::new()));
        assert_eq!(api.quote_price(&aapl()).await, Ok(189.9));
    }

    #[tokio::test]
    async fn transport_failure_is_source_unavailable() {
        let api = YahooQuoteApi::new(Arc::new(RoutedHttpClient::new()));

        let error = api
            .latest_close(&aapl(), LookbackWindow::FiveDays)
            .await
            .expect_err("5d route times out");
        assert_eq!(error.kind(), crate::FetchErrorKind::SourceUnavailable);
    }

    #[tokio::test]
    async fn metadata_price_uses_regular_market_price_when_current_missing() {
        let client = Arc::new(RoutedHttpClient::new());
        let api = YahooQuoteApi::new(client.clone());

        let (price, field) = api.metadata_price(&aapl()).await.expect("metadata price");
        assert_eq!(price, 412.5);
        assert_eq!(field, MetadataField::RegularMarketPrice);

        // Second call reuses the cached crumb.
        api.metadata_price(&aapl()).await.expect("metadata price");
        let crumb_calls = client
            .requests
            .lock()
            .expect("request log should not be poisoned")
            .iter()
            .filter(|url| url.contains("getcrumb"))
            .count();
        assert_eq!(crumb_calls, 1);
    }

    #[test]
    fn chart_error_payload_is_reported() {
        let response: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .expect("valid payload");
        let error = response.chart.error.expect("error present");
        assert!(error.to_string().contains("delisted"));
    }
}
