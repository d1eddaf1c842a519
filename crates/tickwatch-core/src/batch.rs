use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::Sleeper;
use crate::{Instrument, PriceMap, Symbol};

/// Fixed wait between sequential symbol lookups.
pub const PACING_DELAY: Duration = Duration::from_secs(3);

/// Resolves one symbol to an optional price.
pub trait SymbolFetcher: Send + Sync {
    fn fetch_price<'a>(
        &'a self,
        symbol: &'a Symbol,
        display_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<f64>> + Send + 'a>>;
}

/// Fetches a list of symbols one after another with a pacing delay in between.
#[derive(Clone)]
pub struct BatchPriceFetcher {
    fetcher: Arc<dyn SymbolFetcher>,
    sleeper: Arc<dyn Sleeper>,
    pacing: Duration,
}

impl BatchPriceFetcher {
    pub fn new(fetcher: Arc<dyn SymbolFetcher>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            fetcher,
            sleeper,
            pacing: PACING_DELAY,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Every input symbol ends up as a key of the returned map, priced or not.
    pub async fn fetch_all(&self, symbols: &[Symbol], names: &HashMap<Symbol, String>) -> PriceMap {
        let mut prices = PriceMap::new();

        for (index, symbol) in symbols.iter().enumerate() {
            let name = names.get(symbol).map(String::as_str).unwrap_or("");
            let price = self.fetcher.fetch_price(symbol, name).await;
            prices.insert(symbol.clone(), price);

            if index + 1 < symbols.len() {
                debug!(%symbol, pacing_ms = self.pacing.as_millis() as u64, "pacing before next symbol");
                self.sleeper.sleep(self.pacing).await;
            }
        }

        let missing = prices.missing().count();
        info!(requested = symbols.len(), fetched = prices.len() - missing, missing, "batch fetch finished");
        prices
    }

    /// Fetches the symbols of `instruments` in declaration order.
    pub async fn fetch_instruments(&self, instruments: &[Instrument]) -> PriceMap {
        let symbols = instruments
            .iter()
            .map(|instrument| instrument.symbol.clone())
            .collect::<Vec<_>>();
        let names = instruments
            .iter()
            .filter_map(|instrument| {
                instrument
                    .display_name
                    .clone()
                    .map(|name| (instrument.symbol.clone(), name))
            })
            .collect::<HashMap<_, _>>();

        self.fetch_all(&symbols, &names).await
    }
}
