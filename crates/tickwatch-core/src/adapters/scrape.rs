use std::sync::Arc;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::source::SourceKind;
use crate::{price_text, Symbol};

/// Fixed per-request deadline for scraped pages.
pub const SCRAPE_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_EXCHANGE: &str = "NASDAQ";

/// Ordered CSS selectors tried against each site's quote page.
///
/// Page structures change without notice, so these are configuration rather
/// than logic and can be replaced from the instrument config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub google_finance: Vec<String>,
    pub marketwatch: Vec<String>,
    pub boursorama: Vec<String>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        fn owned(selectors: &[&str]) -> Vec<String> {
            selectors.iter().map(|s| (*s).to_owned()).collect()
        }

        Self {
            google_finance: owned(&["div.YMlKec.fxKbKc", "[data-last-price]", "div[jsname=\"ip75Cb\"]"]),
            marketwatch: owned(&[
                "bg-quote.value",
                "h3.intraday__price span.value",
                "[class*=\"LastPrice\"]",
            ]),
            boursorama: owned(&[
                "span.c-instrument--last",
                "span.c-faceplate__price",
                "div.c-faceplate__price span",
                "[data-ist-last]",
            ]),
        }
    }
}

impl SelectorSet {
    pub fn for_site(&self, site: SourceKind) -> &[String] {
        match site {
            SourceKind::GoogleFinance => &self.google_finance,
            SourceKind::MarketWatch => &self.marketwatch,
            SourceKind::Boursorama => &self.boursorama,
            SourceKind::YahooQuote => &[],
        }
    }
}

/// Quote page URL for a scraped site, using that site's symbol format.
pub fn page_url(site: SourceKind, symbol: &Symbol) -> Option<String> {
    match site {
        SourceKind::GoogleFinance => {
            let (ticker, exchange) = symbol.split_exchange();
            Some(format!(
                "https://www.google.com/finance/quote/{}:{}",
                urlencoding::encode(ticker),
                exchange.unwrap_or(DEFAULT_EXCHANGE)
            ))
        }
        SourceKind::MarketWatch => Some(format!(
            "https://www.marketwatch.com/investing/stock/{}",
            urlencoding::encode(&symbol.as_str().to_ascii_lowercase())
        )),
        SourceKind::Boursorama => Some(format!(
            "https://www.boursorama.com/cours/1rP{}/",
            urlencoding::encode(symbol.as_str())
        )),
        SourceKind::YahooQuote => None,
    }
}

/// Scrapes quote pages and reads the price out of the first matching element.
#[derive(Clone)]
pub struct HtmlScraper {
    http_client: Arc<dyn HttpClient>,
    selectors: SelectorSet,
}

impl HtmlScraper {
    pub fn new(http_client: Arc<dyn HttpClient>, selectors: SelectorSet) -> Self {
        Self {
            http_client,
            selectors,
        }
    }

    pub async fn fetch(&self, site: SourceKind, symbol: &Symbol) -> Result<f64, FetchError> {
        let origin = site.as_str();
        let url = page_url(site, symbol)
            .ok_or_else(|| FetchError::unavailable(origin, "source has no scrapeable page"))?;

        debug!(%symbol, source = origin, %url, "fetching quote page");
        let request = HttpRequest::get(url).with_timeout_ms(SCRAPE_TIMEOUT_MS);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| FetchError::unavailable(origin, format!("transport error: {}", e.message())))?;

        if !response.is_success() {
            return Err(FetchError::unavailable(
                origin,
                format!("returned status {}", response.status),
            ));
        }

        extract_price(origin, &response.body, self.selectors.for_site(site))
    }
}

/// Applies `selectors` in order; the first element whose text parses as a price wins.
pub fn extract_price(origin: &'static str, html: &str, selectors: &[String]) -> Result<f64, FetchError> {
    let document = Html::parse_document(html);
    let mut unparsed_text = None;

    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(error) => {
                warn!(source = origin, selector = %raw, %error, "skipping invalid selector");
                continue;
            }
        };

        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        match price_text::extract(text).filter(|price| *price > 0.0) {
            Some(price) => return Ok(price),
            None => {
                debug!(source = origin, selector = %raw, text, "element text is not a price");
                if unparsed_text.is_none() {
                    unparsed_text = Some(text.to_owned());
                }
            }
        }
    }

    match unparsed_text {
        Some(text) => Err(FetchError::parse_failure(origin, text)),
        None => Err(FetchError::no_data(origin, "no price element matched")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchErrorKind;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[test]
    fn builds_site_specific_urls() {
        assert_eq!(
            page_url(SourceKind::GoogleFinance, &symbol("AAPL")).as_deref(),
            Some("https://www.google.com/finance/quote/AAPL:NASDAQ")
        );
        assert_eq!(
            page_url(SourceKind::GoogleFinance, &symbol("AIR:EPA")).as_deref(),
            Some("https://www.google.com/finance/quote/AIR:EPA")
        );
        assert_eq!(
            page_url(SourceKind::MarketWatch, &symbol("MSFT")).as_deref(),
            Some("https://www.marketwatch.com/investing/stock/msft")
        );
        assert_eq!(
            page_url(SourceKind::Boursorama, &symbol("AAPL")).as_deref(),
            Some("https://www.boursorama.com/cours/1rPAAPL/")
        );
        assert_eq!(page_url(SourceKind::YahooQuote, &symbol("AAPL")), None);
    }

    #[test]
    fn first_matching_selector_wins() {
        let html = r#"<html><body>
            <span class="c-faceplate__price">175,50 USD</span>
            <div data-ist-last="1">180.00</div>
        </body></html>"#;
        let selectors = SelectorSet::default();

        let price = extract_price("boursorama", html, selectors.for_site(SourceKind::Boursorama));
        assert_eq!(price, Ok(175.50));
    }

    #[test]
    fn unparseable_text_falls_through_to_next_selector() {
        let html = r#"<div class="YMlKec fxKbKc">--</div><div data-last-price="x">$1,234.56</div>"#;
        let selectors = SelectorSet::default();

        let price = extract_price("google_finance", html, selectors.for_site(SourceKind::GoogleFinance));
        assert_eq!(price, Ok(1234.56));
    }

    #[test]
    fn reports_parse_failure_and_missing_element() {
        let selectors = vec![String::from("span.price")];

        let error = extract_price("marketwatch", "<span class=\"price\">closed</span>", &selectors)
            .expect_err("text is not numeric");
        assert_eq!(error.kind(), FetchErrorKind::ParseFailure);

        let error = extract_price("marketwatch", "<p>nothing here</p>", &selectors)
            .expect_err("nothing matches");
        assert_eq!(error.kind(), FetchErrorKind::NoDataFound);
    }

    #[test]
    fn invalid_selector_is_skipped() {
        let selectors = vec![String::from("[[["), String::from("bg-quote.value")];
        let html = "<bg-quote class=\"value\">412.10</bg-quote>";

        assert_eq!(extract_price("marketwatch", html, &selectors), Ok(412.10));
    }
}
