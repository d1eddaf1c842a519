use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::adapters::PriceSources;
use crate::error::FetchError;
use crate::source::SourceKind;
use crate::Symbol;

/// Outcome of one source tried while routing a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttempt {
    pub source: SourceKind,
    pub error: FetchError,
}

/// Successful routed lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceHit {
    pub price: f64,
    pub selected_source: SourceKind,
    pub source_chain: Vec<SourceKind>,
    /// Sources that failed before `selected_source` answered.
    pub failed: Vec<FetchAttempt>,
    pub latency_ms: u64,
}

/// Failed routed lookup after exhausting every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteFailure {
    pub error: FetchError,
    pub source_chain: Vec<SourceKind>,
    pub failed: Vec<FetchAttempt>,
    pub latency_ms: u64,
}

pub type RouteResult = Result<SourceHit, RouteFailure>;

/// Tries sources in order until one yields a price.
#[derive(Clone)]
pub struct FallbackFetchStrategy {
    sources: PriceSources,
    order: Vec<SourceKind>,
}

impl FallbackFetchStrategy {
    pub fn new(sources: PriceSources, order: &[SourceKind]) -> Self {
        let order = if order.is_empty() {
            SourceKind::DEFAULT_SCRAPE_ORDER.to_vec()
        } else {
            dedupe_chain(order)
        };

        Self { sources, order }
    }

    pub fn with_default_order(sources: PriceSources) -> Self {
        Self::new(sources, &SourceKind::DEFAULT_SCRAPE_ORDER)
    }

    pub fn order(&self) -> &[SourceKind] {
        &self.order
    }

    /// First price produced by `order`, or `None` once every source failed.
    pub async fn fetch(&self, symbol: &Symbol, order: &[SourceKind]) -> Option<f64> {
        match self.route(symbol, order).await {
            Ok(hit) => Some(hit.price),
            Err(failure) => {
                warn!(
                    %symbol,
                    code = failure.error.code(),
                    chain = ?failure.source_chain,
                    latency_ms = failure.latency_ms,
                    "{}",
                    failure.error
                );
                None
            }
        }
    }

    /// [`fetch`](Self::fetch) over the configured order.
    pub async fn fetch_default(&self, symbol: &Symbol) -> Option<f64> {
        self.fetch(symbol, &self.order).await
    }

    /// Walks the deduplicated `order`, recording every failed source.
    pub async fn route(&self, symbol: &Symbol, order: &[SourceKind]) -> RouteResult {
        let started = Instant::now();
        let planned_chain = dedupe_chain(order);
        let mut source_chain = Vec::with_capacity(planned_chain.len());
        let mut failed = Vec::new();

        for source in planned_chain {
            source_chain.push(source);

            match self.sources.try_fetch(source, symbol).await {
                Ok(price) => {
                    if failed.is_empty() {
                        info!(%symbol, source = source.as_str(), price, "fetched price");
                    } else {
                        info!(
                            %symbol,
                            source = source.as_str(),
                            price,
                            "source fallback succeeded after {} failed attempt(s)",
                            failed.len()
                        );
                    }

                    return Ok(SourceHit {
                        price,
                        selected_source: source,
                        source_chain,
                        failed,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    debug!(%symbol, source = source.as_str(), code = error.code(), %error, "source failed, trying next");
                    failed.push(FetchAttempt { source, error });
                }
            }
        }

        Err(RouteFailure {
            error: FetchError::AllSourcesExhausted {
                symbol: symbol.to_string(),
                attempts: failed.len(),
            },
            source_chain,
            failed,
            latency_ms: elapsed_ms(started),
        })
    }
}

fn dedupe_chain(chain: &[SourceKind]) -> Vec<SourceKind> {
    let mut seen = HashSet::new();
    let mut output = Vec::with_capacity(chain.len());

    for source in chain {
        if seen.insert(*source) {
            output.push(*source);
        }
    }

    output
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
