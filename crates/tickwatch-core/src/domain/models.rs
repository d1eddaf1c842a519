use std::fmt::{Display, Formatter};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::Symbol;

/// A tracked symbol with its threshold configuration.
///
/// Threshold values that are absent, zero, negative or non-finite are
/// disabled and never produce a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub upper_threshold: Option<f64>,
    #[serde(default)]
    pub lower_threshold: Option<f64>,
    #[serde(default)]
    pub initial_value: Option<f64>,
}

impl Instrument {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            display_name: None,
            upper_threshold: None,
            lower_threshold: None,
            initial_value: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    pub fn with_upper(mut self, threshold: f64) -> Self {
        self.upper_threshold = Some(threshold);
        self
    }

    pub fn with_lower(mut self, threshold: f64) -> Self {
        self.lower_threshold = Some(threshold);
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// `Name (SYMBOL)` when a name is configured, otherwise the bare symbol.
    pub fn label(&self) -> String {
        display_label(&self.symbol, self.display_name.as_deref().unwrap_or(""))
    }

    /// Upper threshold if it is enabled.
    pub fn active_upper(&self) -> Option<f64> {
        self.upper_threshold.filter(|value| is_enabled(*value))
    }

    /// Lower threshold if it is enabled.
    pub fn active_lower(&self) -> Option<f64> {
        self.lower_threshold.filter(|value| is_enabled(*value))
    }
}

fn is_enabled(threshold: f64) -> bool {
    threshold.is_finite() && threshold > 0.0
}

/// Formats the human-facing label used in logs and reports.
pub fn display_label(symbol: &Symbol, name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        symbol.to_string()
    } else {
        format!("{name} ({symbol})")
    }
}

/// Price observed for a symbol in one cycle. `None` means undetermined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    pub symbol: Symbol,
    pub value: Option<f64>,
}

/// Prices for every requested symbol, in request order.
///
/// A symbol that was requested always has an entry, even when its price
/// could not be determined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMap {
    readings: Vec<PriceReading>,
}

impl PriceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reading, replacing any previous value for the same symbol.
    pub fn insert(&mut self, symbol: Symbol, value: Option<f64>) {
        match self.readings.iter_mut().find(|r| r.symbol == symbol) {
            Some(existing) => existing.value = value,
            None => self.readings.push(PriceReading { symbol, value }),
        }
    }

    pub fn reading(&self, symbol: &Symbol) -> Option<&PriceReading> {
        self.readings.iter().find(|r| &r.symbol == symbol)
    }

    /// Price for `symbol`, flattening "not requested" and "undetermined".
    pub fn price(&self, symbol: &Symbol) -> Option<f64> {
        self.reading(symbol).and_then(|r| r.value)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.reading(symbol).is_some()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceReading> {
        self.readings.iter()
    }

    pub fn missing(&self) -> impl Iterator<Item = &Symbol> {
        self.readings
            .iter()
            .filter(|r| r.value.is_none())
            .map(|r| &r.symbol)
    }
}

impl FromIterator<(Symbol, Option<f64>)> for PriceMap {
    fn from_iter<I: IntoIterator<Item = (Symbol, Option<f64>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (symbol, value) in iter {
            map.insert(symbol, value);
        }
        map
    }
}

impl Serialize for PriceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.readings.len()))?;
        for reading in &self.readings {
            map.serialize_entry(reading.symbol.as_str(), &reading.value)?;
        }
        map.end()
    }
}

/// Which side of the band was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdKind {
    Upper,
    Lower,
}

impl ThresholdKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl Display for ThresholdKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold crossing detected in one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub symbol: Symbol,
    pub display_name: String,
    pub current_price: f64,
    pub threshold: f64,
    pub threshold_kind: ThresholdKind,
    pub message: String,
}

impl Violation {
    pub fn new(instrument: &Instrument, price: f64, threshold: f64, kind: ThresholdKind) -> Self {
        let label = instrument.label();
        let verb = match kind {
            ThresholdKind::Upper => "reached",
            ThresholdKind::Lower => "dropped to",
        };
        let message =
            format!("{label} {verb} ${price:.4} ({kind} threshold: ${threshold:.4})");

        Self {
            symbol: instrument.symbol.clone(),
            display_name: label,
            current_price: price,
            threshold,
            threshold_kind: kind,
            message,
        }
    }
}

/// Where an instrument's latest price sits relative to its band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Ok,
    AboveUpper,
    BelowLower,
    Unknown,
}

impl StatusState {
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::AboveUpper | Self::BelowLower)
    }
}

/// Per-instrument snapshot rendered in the periodic summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentStatus {
    pub symbol: Symbol,
    pub display_name: String,
    pub price: Option<f64>,
    pub upper_threshold: Option<f64>,
    pub lower_threshold: Option<f64>,
    pub state: StatusState,
    /// Percent change against the configured initial value.
    pub change_pct: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[test]
    fn label_prefers_name() {
        let named = Instrument::new(symbol("AAPL")).with_name("Apple");
        assert_eq!(named.label(), "Apple (AAPL)");

        let bare = Instrument::new(symbol("AAPL")).with_name("  ");
        assert_eq!(bare.label(), "AAPL");
    }

    #[test]
    fn non_positive_thresholds_are_disabled() {
        let instrument = Instrument::new(symbol("AAPL")).with_upper(0.0).with_lower(-1.0);
        assert_eq!(instrument.active_upper(), None);
        assert_eq!(instrument.active_lower(), None);

        let instrument = Instrument::new(symbol("AAPL")).with_upper(f64::NAN);
        assert_eq!(instrument.active_upper(), None);
    }

    #[test]
    fn price_map_keeps_request_order_and_missing_entries() {
        let mut prices = PriceMap::new();
        prices.insert(symbol("MSFT"), None);
        prices.insert(symbol("AAPL"), Some(190.5));
        prices.insert(symbol("MSFT"), Some(410.0));

        let order = prices.iter().map(|r| r.symbol.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["MSFT", "AAPL"]);
        assert_eq!(prices.price(&symbol("MSFT")), Some(410.0));
        assert!(!prices.contains(&symbol("NVDA")));

        let json = serde_json::to_string(&prices).expect("serializable");
        assert_eq!(json, r#"{"MSFT":410.0,"AAPL":190.5}"#);
    }

    #[test]
    fn violation_message_embeds_kind_and_four_decimals() {
        let instrument = Instrument::new(symbol("AAPL")).with_name("Apple");
        let violation = Violation::new(&instrument, 205.0, 200.0, ThresholdKind::Upper);
        assert_eq!(
            violation.message,
            "Apple (AAPL) reached $205.0000 (upper threshold: $200.0000)"
        );

        let violation = Violation::new(&instrument, 149.123456, 150.0, ThresholdKind::Lower);
        assert_eq!(
            violation.message,
            "Apple (AAPL) dropped to $149.1235 (lower threshold: $150.0000)"
        );
    }
}
