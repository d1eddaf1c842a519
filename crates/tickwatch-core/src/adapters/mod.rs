//! Price source adapters.
//!
//! | Source | Adapter | Symbol format |
//! |--------|---------|---------------|
//! | [`SourceKind::YahooQuote`] | [`YahooQuoteApi`] | as configured |
//! | [`SourceKind::GoogleFinance`] | [`HtmlScraper`] | `SYMBOL:EXCHANGE` (default NASDAQ) |
//! | [`SourceKind::MarketWatch`] | [`HtmlScraper`] | lowercase symbol |
//! | [`SourceKind::Boursorama`] | [`HtmlScraper`] | `1rP` + symbol |

mod scrape;
mod yahoo;

use std::sync::Arc;

pub use scrape::{extract_price, page_url, HtmlScraper, SelectorSet, SCRAPE_TIMEOUT_MS};
pub use yahoo::{LookbackWindow, MetadataField, YahooAuthManager, YahooQuoteApi};

use crate::error::FetchError;
use crate::http_client::HttpClient;
use crate::source::SourceKind;
use crate::Symbol;

/// The closed set of price sources, dispatched by [`SourceKind`].
#[derive(Clone)]
pub struct PriceSources {
    quote_api: YahooQuoteApi,
    scraper: HtmlScraper,
}

impl PriceSources {
    pub fn new(http_client: Arc<dyn HttpClient>, selectors: SelectorSet) -> Self {
        Self {
            quote_api: YahooQuoteApi::new(http_client.clone()),
            scraper: HtmlScraper::new(http_client, selectors),
        }
    }

    pub fn quote_api(&self) -> &YahooQuoteApi {
        &self.quote_api
    }

    /// One lookup against one source.
    pub async fn try_fetch(&self, source: SourceKind, symbol: &Symbol) -> Result<f64, FetchError> {
        match source {
            SourceKind::YahooQuote => self.quote_api.quote_price(symbol).await,
            SourceKind::GoogleFinance | SourceKind::MarketWatch | SourceKind::Boursorama => {
                self.scraper.fetch(source, symbol).await
            }
        }
    }
}
