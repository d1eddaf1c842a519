//! Retry logic with exponential backoff, and the retrying price fetcher built on it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapters::{LookbackWindow, YahooQuoteApi};
use crate::batch::SymbolFetcher;
use crate::clock::Sleeper;
use crate::error::FetchError;
use crate::fallback::FallbackFetchStrategy;
use crate::{display_label, Symbol};

/// Attempts made per symbol when nothing else is configured.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Doubling wait between quote API attempts: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    /// 1s, 2s, 4s... up to one minute.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    /// Delay after the zero-based `attempt` failed.
    pub fn delay(self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|scale| self.base.checked_mul(scale))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// How hard the primary quote path is pushed for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, each covering every lookback window plus the metadata fallback.
    pub retry_count: u32,
    /// Lookback windows tried in order within an attempt, shortest first.
    pub windows: Vec<LookbackWindow>,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            windows: LookbackWindow::ALL.to_vec(),
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn with_retry_count(retry_count: u32) -> Self {
        Self {
            retry_count: retry_count.max(1),
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Quote API lookups with bounded retries, optionally preceded by scraping.
#[derive(Clone)]
pub struct RetryingFetcher {
    quote_api: YahooQuoteApi,
    scraping: Option<FallbackFetchStrategy>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingFetcher {
    pub fn new(quote_api: YahooQuoteApi, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            quote_api,
            scraping: None,
            policy,
            sleeper,
        }
    }

    /// Tries `strategy` before the quote API on every lookup.
    pub fn with_scraping(mut self, strategy: FallbackFetchStrategy) -> Self {
        self.scraping = Some(strategy);
        self
    }

    pub async fn fetch(&self, symbol: &Symbol, display_name: &str) -> Option<f64> {
        self.fetch_with_retries(symbol, display_name, self.policy.retry_count)
            .await
    }

    pub async fn fetch_with_retries(
        &self,
        symbol: &Symbol,
        display_name: &str,
        retry_count: u32,
    ) -> Option<f64> {
        let label = display_label(symbol, display_name);

        if let Some(scraping) = &self.scraping {
            if let Some(price) = scraping.fetch_default(symbol).await {
                return Some(price);
            }
            info!(%symbol, "scraping found nothing, falling back to quote api");
        }

        let retry_count = retry_count.max(1);
        for attempt in 0..retry_count {
            match self.attempt(symbol).await {
                Ok(price) => {
                    info!(%symbol, attempt, price, "{label} priced");
                    return Some(price);
                }
                Err(error) => {
                    warn!(%symbol, attempt, code = error.code(), %error, "attempt failed for {label}");
                }
            }

            if attempt + 1 < retry_count {
                let delay = self.policy.delay_for_attempt(attempt);
                debug!(%symbol, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(delay).await;
            }
        }

        let exhausted = FetchError::AllSourcesExhausted {
            symbol: symbol.to_string(),
            attempts: retry_count as usize,
        };
        warn!(%symbol, code = exhausted.code(), "{exhausted}");
        None
    }

    /// One attempt: every lookback window, then the metadata fields.
    async fn attempt(&self, symbol: &Symbol) -> Result<f64, FetchError> {
        for window in &self.policy.windows {
            match self.quote_api.latest_close(symbol, *window).await {
                Ok(price) => return Ok(price),
                Err(error) => {
                    debug!(%symbol, window = window.as_range(), %error, "window yielded nothing");
                }
            }
        }

        let (price, field) = self.quote_api.metadata_price(symbol).await?;
        debug!(%symbol, field = field.as_str(), "priced from ticker metadata");
        Ok(price)
    }
}

impl SymbolFetcher for RetryingFetcher {
    fn fetch_price<'a>(
        &'a self,
        symbol: &'a Symbol,
        display_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<f64>> + Send + 'a>> {
        Box::pin(self.fetch(symbol, display_name))
    }
}
