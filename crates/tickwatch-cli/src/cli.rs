//! CLI argument definitions for tickwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Check on an interval and send periodic summaries until Ctrl-C |
//! | `check` | Run one check cycle and print the outcome |
//! | `summary` | Run one summary cycle |
//! | `quote` | Fetch prices for symbols |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `config/stocks.json` | Instrument config file |
//! | `--log-level` | `RUST_LOG` or `info` | Log filter directive |
//! | `--scrape` | `false` | Scrape quote pages before the quote API |
//! | `--retries` | `3` | Quote API attempts per symbol |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! tickwatch run
//! tickwatch check --config config/stocks.json --pretty
//! tickwatch quote AAPL MC.PA --scrape
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Stock price threshold monitor.
///
/// Fetches prices for the instruments in the config file, reports every
/// upper or lower threshold crossing and sends a periodic summary.
#[derive(Debug, Parser)]
#[command(name = "tickwatch", author, version, about = "Stock price threshold monitor")]
pub struct Cli {
    /// Instrument config file (overrides CONFIG_PATH).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tickwatch_core=debug` (overrides RUST_LOG).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Scrape quote pages before falling back to the quote API (overrides USE_WEB_SCRAPING).
    #[arg(long, global = true, default_value_t = false)]
    pub scrape: bool,

    /// Quote API attempts per symbol (overrides RETRY_COUNT).
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: Option<u32>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check immediately, then on every interval, with periodic summaries.
    ///
    /// Intervals come from CHECK_INTERVAL_MINUTES and SUMMARY_INTERVAL_HOURS.
    /// Stops on Ctrl-C.
    Run,

    /// Run one check cycle and print its outcome as JSON.
    Check,

    /// Run one summary cycle and print its outcome as JSON.
    Summary,

    /// Fetch prices for one or more symbols.
    ///
    /// # Examples
    ///
    ///   tickwatch quote AAPL
    ///   tickwatch quote AAPL MSFT MC.PA --pretty
    Quote(QuoteArgs),
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more market symbols (e.g., AAPL, MC.PA, ^GSPC).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}
