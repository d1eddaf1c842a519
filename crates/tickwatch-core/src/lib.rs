//! # Tickwatch Core
//!
//! Price acquisition and threshold evaluation for the tickwatch stock monitor.
//!
//! ## Overview
//!
//! - **Price text parsing** for scraped quote pages (currency markers, separator ambiguity)
//! - **Source adapters** for the Yahoo quote API and three scraped quote pages
//! - **Fallback routing** across sources in a configured order
//! - **Retrying fetcher** with lookback windows, metadata fallback and exponential backoff
//! - **Batch fetching** with fixed pacing between symbols
//! - **Threshold evaluation** producing ordered, typed violations
//! - **Monitor** running non-overlapping check and summary cycles
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo quote API and HTML scraper |
//! | [`batch`] | Sequential, paced batch fetching |
//! | [`cache`] | Last prices seen by the check cycle |
//! | [`clock`] | Sleep abstraction for backoff and pacing |
//! | [`config`] | Instrument file and environment settings |
//! | [`domain`] | Symbols, instruments, prices, violations |
//! | [`error`] | Validation, config and fetch errors |
//! | [`fallback`] | Ordered source fallback |
//! | [`http_client`] | HTTP client abstraction |
//! | [`monitor`] | Check and summary cycles |
//! | [`notifier`] | Alert and summary delivery |
//! | [`price_text`] | Numeric price extraction from page text |
//! | [`report`] | Text and HTML report rendering |
//! | [`retry`] | Backoff and the retrying fetcher |
//! | [`source`] | Source identifiers |
//! | [`threshold`] | Threshold evaluation |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickwatch_core::{LogNotifier, Monitor, ReqwestHttpClient, Settings, TokioSleeper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let monitor = Monitor::from_settings(
//!         &settings,
//!         Arc::new(ReqwestHttpClient::new()),
//!         Arc::new(TokioSleeper),
//!         Arc::new(LogNotifier),
//!     );
//!
//!     println!("{:?}", monitor.check_cycle().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ Monitor            │── config ──▶ instruments
//! └─────────┬──────────┘
//!           │
//!           ▼
//! ┌────────────────────┐     ┌────────────────────┐
//! │ BatchPriceFetcher  │────▶│ RetryingFetcher    │
//! └────────────────────┘     └─────────┬──────────┘
//!                                      │ scraping first (optional)
//!                                      ▼
//!                            ┌────────────────────┐     ┌──────────────┐
//!                            │ FallbackStrategy   │────▶│ HTTP Client  │
//!                            └────────────────────┘     └──────────────┘
//!           │
//!           ▼
//! ┌────────────────────┐     ┌────────────────────┐
//! │ ThresholdEvaluator │────▶│ Notifier           │
//! └────────────────────┘     └────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never abort a cycle. Internally every source returns a
//! [`FetchError`]; at the public fetch boundaries the error is logged and the
//! price becomes `None`:
//!
//! ```rust
//! use tickwatch_core::{FetchError, FetchErrorKind};
//!
//! fn describe(error: &FetchError) -> &'static str {
//!     match error.kind() {
//!         FetchErrorKind::SourceUnavailable => "network or HTTP failure",
//!         FetchErrorKind::NoDataFound => "reachable but no price",
//!         FetchErrorKind::ParseFailure => "price text not numeric",
//!         FetchErrorKind::AllSourcesExhausted => "every source failed",
//!     }
//! }
//! ```

pub mod adapters;
pub mod batch;
pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod monitor;
pub mod notifier;
pub mod price_text;
pub mod report;
pub mod retry;
pub mod source;
pub mod threshold;

// Adapters
pub use adapters::{HtmlScraper, LookbackWindow, PriceSources, SelectorSet, YahooQuoteApi};

// Batch fetching
pub use batch::{BatchPriceFetcher, SymbolFetcher, PACING_DELAY};

// Caching
pub use cache::{CachedPrices, PriceCache};

// Clock
pub use clock::{RecordingSleeper, Sleeper, TokioSleeper};

// Configuration
pub use config::{FetchMode, Settings, WatchConfig};

// Domain models
pub use domain::{
    display_label, Instrument, InstrumentStatus, PriceMap, PriceReading, StatusState, Symbol,
    ThresholdKind, Violation,
};

// Error types
pub use error::{ConfigError, FetchError, FetchErrorKind, ValidationError};

// Fallback routing
pub use fallback::{FallbackFetchStrategy, FetchAttempt, RouteFailure, RouteResult, SourceHit};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Monitor
pub use monitor::{price_fetcher, CycleOutcome, Monitor, SummaryOutcome};

// Notifier
pub use notifier::{LogNotifier, Notifier};

// Retry logic
pub use retry::{Backoff, RetryPolicy, RetryingFetcher};

// Source identifiers
pub use source::SourceKind;

// Threshold evaluation
pub use threshold::ThresholdEvaluator;
