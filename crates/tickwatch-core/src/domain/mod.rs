//! # Domain Models
//!
//! Canonical domain types for tickwatch.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker symbol |
//! | [`Instrument`] | Tracked symbol with upper/lower thresholds |
//! | [`PriceMap`] | Per-cycle prices, one entry per requested symbol |
//! | [`Violation`] | Threshold crossing detected in a cycle |
//! | [`InstrumentStatus`] | Summary snapshot for one instrument |

mod models;
mod symbol;

pub use models::{
    display_label, Instrument, InstrumentStatus, PriceMap, PriceReading, StatusState,
    ThresholdKind, Violation,
};
pub use symbol::Symbol;
