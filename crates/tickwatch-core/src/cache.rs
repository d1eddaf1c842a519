//! Last prices seen by the check cycle, shared with the summary cycle.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::PriceMap;

/// Prices from one completed check cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPrices {
    pub prices: PriceMap,
    pub captured_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct CacheInner {
    latest: Option<CachedPrices>,
}

/// Thread-safe holder of the most recent price map.
#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached map, stamping it with the current time.
    pub async fn store(&self, prices: PriceMap) {
        self.store_at(prices, OffsetDateTime::now_utc()).await;
    }

    pub async fn store_at(&self, prices: PriceMap, captured_at: OffsetDateTime) {
        let mut store = self.inner.write().await;
        store.latest = Some(CachedPrices {
            prices,
            captured_at,
        });
    }

    pub async fn latest(&self) -> Option<CachedPrices> {
        let store = self.inner.read().await;
        store.latest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;

    #[tokio::test]
    async fn test_price_cache_store_and_replace() {
        let cache = PriceCache::new();
        let aapl = Symbol::parse("AAPL").expect("valid symbol");

        assert!(cache.latest().await.is_none());

        cache.store(PriceMap::from_iter([(aapl.clone(), Some(190.0))])).await;
        let first = cache.latest().await.expect("cache populated");
        assert_eq!(first.prices.price(&aapl), Some(190.0));

        let captured_at = OffsetDateTime::UNIX_EPOCH;
        cache
            .store_at(PriceMap::from_iter([(aapl.clone(), None)]), captured_at)
            .await;
        let latest = cache.latest().await.expect("cache populated");
        assert_eq!(latest.captured_at, captured_at);
        assert_eq!(latest.prices.price(&aapl), None);
        assert!(latest.prices.contains(&aapl));
    }
}
