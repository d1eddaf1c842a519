//! Check and summary cycles over the configured instruments.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::adapters::{PriceSources, SelectorSet};
use crate::batch::BatchPriceFetcher;
use crate::cache::PriceCache;
use crate::clock::Sleeper;
use crate::config::{FetchMode, Settings, WatchConfig};
use crate::fallback::FallbackFetchStrategy;
use crate::http_client::HttpClient;
use crate::notifier::Notifier;
use crate::retry::{RetryPolicy, RetryingFetcher};
use crate::threshold::ThresholdEvaluator;
use crate::{Instrument, Symbol, Violation};

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// No instruments are configured.
    NothingToDo,
    Completed {
        fetched: usize,
        missing: Vec<Symbol>,
        violations: Vec<Violation>,
        delivered: bool,
    },
    /// Another cycle was still running.
    Skipped,
}

/// Result of one summary cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SummaryOutcome {
    NothingToDo,
    Sent { instruments: usize, delivered: bool },
    Skipped,
}

/// Builds the per-symbol fetcher described by `settings`.
pub fn price_fetcher(
    settings: &Settings,
    selectors: SelectorSet,
    http_client: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
) -> RetryingFetcher {
    let sources = PriceSources::new(http_client, selectors);
    let fetcher = RetryingFetcher::new(
        sources.quote_api().clone(),
        RetryPolicy::with_retry_count(settings.retry_count),
        sleeper,
    );

    match settings.fetch_mode {
        FetchMode::ApiOnly => fetcher,
        FetchMode::ScrapingFirst => {
            fetcher.with_scraping(FallbackFetchStrategy::new(sources, &settings.scrape_sources))
        }
    }
}

/// Owns everything a cycle needs. Cycles never overlap: a cycle requested
/// while another holds the lock is skipped.
pub struct Monitor {
    config_path: PathBuf,
    fetcher: BatchPriceFetcher,
    evaluator: ThresholdEvaluator,
    notifier: Arc<dyn Notifier>,
    cache: PriceCache,
    cycle_lock: Mutex<()>,
}

impl Monitor {
    pub fn new(
        config_path: impl Into<PathBuf>,
        fetcher: BatchPriceFetcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            fetcher,
            evaluator: ThresholdEvaluator::new(),
            notifier,
            cache: PriceCache::new(),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Wires the production stack. Selectors are read from the config file once, here.
    pub fn from_settings(
        settings: &Settings,
        http_client: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let selectors = WatchConfig::load_or_empty(&settings.config_path).selectors;
        let fetcher = price_fetcher(settings, selectors, http_client, sleeper.clone());
        let batch = BatchPriceFetcher::new(Arc::new(fetcher), sleeper);
        Self::new(settings.config_path.clone(), batch, notifier)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &BatchPriceFetcher {
        &self.fetcher
    }

    /// Instruments as currently on disk; re-read every cycle.
    pub fn instruments(&self) -> Vec<Instrument> {
        WatchConfig::load_or_empty(&self.config_path).instruments
    }

    pub async fn check_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("previous cycle still running, skipping check");
            return CycleOutcome::Skipped;
        };

        let instruments = self.instruments();
        if instruments.is_empty() {
            warn!(path = %self.config_path.display(), "no instruments configured");
            return CycleOutcome::NothingToDo;
        }

        info!(instruments = instruments.len(), "starting check cycle");
        let prices = self.fetcher.fetch_instruments(&instruments).await;
        let missing = prices.missing().cloned().collect::<Vec<_>>();
        let fetched = prices.len() - missing.len();
        let violations = self.evaluator.evaluate(&prices, &instruments);
        self.cache.store(prices).await;

        let delivered = if violations.is_empty() {
            info!(fetched, missing = missing.len(), "no thresholds crossed");
            true
        } else {
            warn!(violations = violations.len(), "thresholds crossed");
            let delivered = self.notifier.send_alert(&violations).await;
            if !delivered {
                error!(violations = violations.len(), "alert delivery failed");
            }
            delivered
        };

        CycleOutcome::Completed {
            fetched,
            missing,
            violations,
            delivered,
        }
    }

    pub async fn summary_cycle(&self) -> SummaryOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            warn!("previous cycle still running, skipping summary");
            return SummaryOutcome::Skipped;
        };

        let instruments = self.instruments();
        if instruments.is_empty() {
            warn!(path = %self.config_path.display(), "no instruments configured");
            return SummaryOutcome::NothingToDo;
        }

        let prices = match self.cache.latest().await {
            Some(cached) if !cached.prices.is_empty() => {
                info!(captured_at = %cached.captured_at, "summarizing cached prices");
                cached.prices
            }
            _ => {
                info!("price cache empty, fetching fresh prices for summary");
                let prices = self.fetcher.fetch_instruments(&instruments).await;
                self.cache.store(prices.clone()).await;
                prices
            }
        };

        let statuses = self.evaluator.statuses(&prices, &instruments);
        let delivered = self.notifier.send_summary(&statuses).await;
        if !delivered {
            error!(instruments = statuses.len(), "summary delivery failed");
        }

        SummaryOutcome::Sent {
            instruments: statuses.len(),
            delivered,
        }
    }
}
