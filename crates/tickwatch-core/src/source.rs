use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Price acquisition channels, one per upstream site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Yahoo Finance quote API.
    YahooQuote,
    /// Google Finance quote page.
    GoogleFinance,
    /// MarketWatch quote page.
    MarketWatch,
    /// Boursorama quote page.
    Boursorama,
}

impl SourceKind {
    /// Scraping order used when none is configured.
    pub const DEFAULT_SCRAPE_ORDER: [Self; 3] =
        [Self::GoogleFinance, Self::MarketWatch, Self::Boursorama];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YahooQuote => "yahoo",
            Self::GoogleFinance => "google_finance",
            Self::MarketWatch => "marketwatch",
            Self::Boursorama => "boursorama",
        }
    }
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yahoo" | "api" => Ok(Self::YahooQuote),
            "google" | "google_finance" => Ok(Self::GoogleFinance),
            "marketwatch" => Ok(Self::MarketWatch),
            "boursorama" => Ok(Self::Boursorama),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Parses a comma separated source list, e.g. `google,marketwatch`.
pub fn parse_source_list(raw: &str) -> Result<Vec<SourceKind>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(SourceKind::from_str)
        .collect()
}
