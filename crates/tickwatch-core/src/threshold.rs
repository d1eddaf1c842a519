use tracing::{debug, warn};

use crate::{Instrument, InstrumentStatus, PriceMap, StatusState, ThresholdKind, Violation};

/// Compares prices against each instrument's threshold band.
///
/// Stateless: identical inputs always yield identical, identically ordered output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThresholdEvaluator;

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Violations in instrument order, upper before lower within an instrument.
    ///
    /// Bounds are inclusive. Instruments without a price are skipped.
    pub fn evaluate(&self, prices: &PriceMap, instruments: &[Instrument]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for instrument in instruments {
            let Some(price) = prices.price(&instrument.symbol) else {
                warn!(symbol = %instrument.symbol, "no price available, skipping threshold check");
                continue;
            };

            if let Some(upper) = instrument.active_upper() {
                if price >= upper {
                    violations.push(Violation::new(instrument, price, upper, ThresholdKind::Upper));
                }
            }

            if let Some(lower) = instrument.active_lower() {
                if price <= lower {
                    violations.push(Violation::new(instrument, price, lower, ThresholdKind::Lower));
                }
            }
        }

        debug!(instruments = instruments.len(), violations = violations.len(), "thresholds evaluated");
        violations
    }

    /// One status row per instrument, for the periodic summary.
    pub fn statuses(&self, prices: &PriceMap, instruments: &[Instrument]) -> Vec<InstrumentStatus> {
        instruments
            .iter()
            .map(|instrument| {
                let price = prices.price(&instrument.symbol);
                InstrumentStatus {
                    symbol: instrument.symbol.clone(),
                    display_name: instrument.label(),
                    price,
                    upper_threshold: instrument.active_upper(),
                    lower_threshold: instrument.active_lower(),
                    state: classify(instrument, price),
                    change_pct: price.and_then(|price| change_pct(instrument.initial_value?, price)),
                }
            })
            .collect()
    }
}

fn classify(instrument: &Instrument, price: Option<f64>) -> StatusState {
    let Some(price) = price else {
        return StatusState::Unknown;
    };

    if instrument.active_upper().is_some_and(|upper| price >= upper) {
        StatusState::AboveUpper
    } else if instrument.active_lower().is_some_and(|lower| price <= lower) {
        StatusState::BelowLower
    } else {
        StatusState::Ok
    }
}

fn change_pct(initial: f64, price: f64) -> Option<f64> {
    (initial.is_finite() && initial != 0.0).then(|| (price - initial) / initial * 100.0)
}
