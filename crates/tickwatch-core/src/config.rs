//! Instrument configuration file and environment-driven runtime settings.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::SelectorSet;
use crate::error::{ConfigError, ValidationError};
use crate::retry::DEFAULT_RETRY_COUNT;
use crate::source::{parse_source_list, SourceKind};
use crate::{Instrument, Symbol};

pub const DEFAULT_CONFIG_PATH: &str = "config/stocks.json";
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 15;
pub const DEFAULT_SUMMARY_INTERVAL_HOURS: u64 = 24;

const ENV_PREFIX: &str = "TICKWATCH_";

/// Tracked instruments plus the scraping selectors, as read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchConfig {
    pub instruments: Vec<Instrument>,
    pub selectors: SelectorSet,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    stocks: Vec<Value>,
    #[serde(default)]
    selectors: Option<SelectorSet>,
}

#[derive(Debug, Deserialize)]
struct RawInstrument {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    upper_threshold: Option<f64>,
    #[serde(default)]
    lower_threshold: Option<f64>,
    #[serde(default)]
    initial_value: Option<f64>,
}

impl RawInstrument {
    fn into_instrument(self) -> Result<Instrument, ValidationError> {
        let symbol = Symbol::parse(self.symbol.as_deref().unwrap_or(""))?;
        Ok(Instrument {
            symbol,
            display_name: self.name.filter(|name| !name.trim().is_empty()),
            upper_threshold: self.upper_threshold,
            lower_threshold: self.lower_threshold,
            initial_value: self.initial_value,
        })
    }
}

impl WatchConfig {
    /// Reads and parses `path`. Unusable entries are skipped, not fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Self::from_json(path, &text)
    }

    /// Like [`load`](Self::load), but any failure yields an empty configuration.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "using empty instrument list");
                Self::default()
            }
        }
    }

    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut instruments: Vec<Instrument> = Vec::with_capacity(raw.stocks.len());
        for (index, entry) in raw.stocks.into_iter().enumerate() {
            let parsed = serde_json::from_value::<RawInstrument>(entry)
                .map_err(|e| e.to_string())
                .and_then(|raw| raw.into_instrument().map_err(|e| e.to_string()));

            match parsed {
                Ok(instrument) if instruments.iter().any(|known| known.symbol == instrument.symbol) => {
                    warn!(index, symbol = %instrument.symbol, "duplicate stock entry ignored");
                }
                Ok(instrument) => instruments.push(instrument),
                Err(reason) => warn!(index, reason = %reason, "skipping unusable stock entry"),
            }
        }

        info!(path = %path.display(), instruments = instruments.len(), "loaded instrument config");
        Ok(Self {
            instruments,
            selectors: raw.selectors.unwrap_or_default(),
        })
    }
}

/// Which acquisition path is tried first for every symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Quote API only.
    ApiOnly,
    /// Scraped sites first, quote API when they all fail.
    ScrapingFirst,
}

/// Runtime tunables, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fetch_mode: FetchMode,
    pub scrape_sources: Vec<SourceKind>,
    pub retry_count: u32,
    pub check_interval: Duration,
    pub summary_interval: Duration,
    pub config_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_mode: FetchMode::ApiOnly,
            scrape_sources: SourceKind::DEFAULT_SCRAPE_ORDER.to_vec(),
            retry_count: DEFAULT_RETRY_COUNT,
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_MINUTES * 60),
            summary_interval: Duration::from_secs(DEFAULT_SUMMARY_INTERVAL_HOURS * 3600),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl Settings {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        dotenv::dotenv().ok(); // a missing .env is fine
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Each setting is read as `TICKWATCH_<NAME>` first, then bare `<NAME>`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .or_else(|| lookup(name))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut settings = Self::default();

        if let Some(value) = read("USE_WEB_SCRAPING") {
            settings.fetch_mode = if parse_bool("USE_WEB_SCRAPING", &value)? {
                FetchMode::ScrapingFirst
            } else {
                FetchMode::ApiOnly
            };
        }
        if let Some(value) = read("SCRAPE_SOURCES") {
            let sources = parse_source_list(&value)?;
            if sources.is_empty() {
                return Err(invalid("SCRAPE_SOURCES", &value));
            }
            settings.scrape_sources = sources;
        }
        if let Some(value) = read("RETRY_COUNT") {
            settings.retry_count = parse_at_least("RETRY_COUNT", &value, 1)? as u32;
        }
        if let Some(value) = read("CHECK_INTERVAL_MINUTES") {
            let minutes = parse_at_least("CHECK_INTERVAL_MINUTES", &value, 1)?;
            settings.check_interval = Duration::from_secs(minutes * 60);
        }
        if let Some(value) = read("SUMMARY_INTERVAL_HOURS") {
            let hours = parse_at_least("SUMMARY_INTERVAL_HOURS", &value, 1)?;
            settings.summary_interval = Duration::from_secs(hours * 3600);
        }
        if let Some(value) = read("CONFIG_PATH") {
            settings.config_path = PathBuf::from(value);
        }

        Ok(settings)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

fn parse_at_least(name: &'static str, value: &str, min: u64) -> Result<u64, ValidationError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|parsed| *parsed >= min && *parsed <= u64::from(u32::MAX))
        .ok_or_else(|| invalid(name, value))
}

fn invalid(name: &'static str, value: &str) -> ValidationError {
    ValidationError::InvalidSetting {
        name,
        value: value.to_owned(),
    }
}
