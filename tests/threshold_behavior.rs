//! Behavior-driven tests for threshold evaluation
//!
//! These tests verify WHEN a price counts as a threshold crossing: inclusive
//! bounds, disabled thresholds, missing prices and stable ordering.

mod support;

use support::symbol;
use tickwatch_core::{Instrument, PriceMap, StatusState, ThresholdEvaluator, ThresholdKind};

fn instrument(raw: &str) -> Instrument {
    Instrument::new(symbol(raw))
}

fn priced(instruments: &[&Instrument], prices: &[Option<f64>]) -> PriceMap {
    instruments
        .iter()
        .zip(prices)
        .map(|(instrument, price)| (instrument.symbol.clone(), *price))
        .collect()
}

#[test]
fn when_price_equals_upper_threshold_exactly_one_violation_is_raised() {
    // Given: An upper threshold of 200
    let apple = instrument("AAPL").with_upper(200.0);
    let evaluator = ThresholdEvaluator::new();

    // When: The price sits exactly on the threshold, then just below it
    let at = evaluator.evaluate(&priced(&[&apple], &[Some(200.0)]), &[apple.clone()]);
    let below = evaluator.evaluate(&priced(&[&apple], &[Some(199.9999)]), &[apple.clone()]);

    // Then: Only the boundary-equal price is a violation
    assert_eq!(at.len(), 1);
    assert_eq!(at[0].threshold_kind, ThresholdKind::Upper);
    assert!(below.is_empty());
}

#[test]
fn when_price_equals_lower_threshold_it_is_a_violation() {
    // Given: A lower threshold of 150
    let apple = instrument("AAPL").with_lower(150.0);

    // When: The price sits exactly on it
    let violations =
        ThresholdEvaluator::new().evaluate(&priced(&[&apple], &[Some(150.0)]), &[apple.clone()]);

    // Then: It counts as a lower crossing
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].threshold_kind, ThresholdKind::Lower);
    assert_eq!(violations[0].threshold, 150.0);
}

#[test]
fn when_thresholds_are_zero_negative_or_absent_nothing_fires() {
    // Given: Disabled thresholds in every supported form
    let zero = instrument("ZERO").with_upper(0.0).with_lower(0.0);
    let negative = instrument("NEG").with_upper(-1.0).with_lower(-1.0);
    let absent = instrument("NONE");
    let instruments = vec![zero.clone(), negative.clone(), absent.clone()];

    // When: Prices are extreme in both directions
    let evaluator = ThresholdEvaluator::new();
    for price in [0.0001, 1.0, 1_000_000.0] {
        let prices = priced(&[&zero, &negative, &absent], &[Some(price); 3]);

        // Then: No violation is ever produced
        assert!(evaluator.evaluate(&prices, &instruments).is_empty(), "price={price}");
    }
}

#[test]
fn when_price_is_missing_the_instrument_is_skipped() {
    // Given: Thresholds that any real price would cross
    let apple = instrument("AAPL").with_upper(0.01).with_lower(1_000_000.0);
    let absent_from_map = instrument("MSFT").with_upper(0.01);

    // When: One price is undetermined and the other symbol was never requested
    let prices = priced(&[&apple], &[None]);
    let violations = ThresholdEvaluator::new().evaluate(&prices, &[apple, absent_from_map]);

    // Then: A missing price never counts as zero or as a breach
    assert!(violations.is_empty());
}

#[test]
fn when_evaluated_twice_the_same_ordered_violations_are_returned() {
    // Given: Several instruments crossing in different directions
    let a = instrument("AAA").with_upper(10.0);
    let b = instrument("BBB").with_lower(10.0);
    let c = instrument("CCC").with_upper(10.0).with_lower(5.0);
    let instruments = vec![a.clone(), b.clone(), c.clone()];
    let prices = priced(&[&a, &b, &c], &[Some(11.0), Some(9.0), Some(12.0)]);
    let evaluator = ThresholdEvaluator::new();

    // When: The same inputs are evaluated twice
    let first = evaluator.evaluate(&prices, &instruments);
    let second = evaluator.evaluate(&prices, &instruments);

    // Then: Results are identical and follow declaration order
    assert_eq!(first, second);
    let order = first
        .iter()
        .map(|violation| violation.symbol.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["AAA", "BBB", "CCC"]);
}

#[test]
fn when_apple_is_above_and_msft_below_both_cross_with_disabled_upper_ignored() {
    // Given: AAPL 150..200, MSFT upper disabled (0) with lower 300
    let apple = instrument("AAPL").with_name("Apple").with_upper(200.0).with_lower(150.0);
    let msft = instrument("MSFT").with_upper(0.0).with_lower(300.0);
    let prices = priced(&[&apple, &msft], &[Some(205.0), Some(295.0)]);

    // When: The thresholds are evaluated
    let violations = ThresholdEvaluator::new().evaluate(&prices, &[apple, msft]);

    // Then: AAPL crosses upper, MSFT crosses lower, nothing else
    assert_eq!(violations.len(), 2);

    assert_eq!(violations[0].symbol.as_str(), "AAPL");
    assert_eq!(violations[0].threshold_kind, ThresholdKind::Upper);
    assert_eq!(violations[0].current_price, 205.0);
    assert_eq!(
        violations[0].message,
        "Apple (AAPL) reached $205.0000 (upper threshold: $200.0000)"
    );

    assert_eq!(violations[1].symbol.as_str(), "MSFT");
    assert_eq!(violations[1].threshold_kind, ThresholdKind::Lower);
    assert_eq!(violations[1].current_price, 295.0);
    assert_eq!(
        violations[1].message,
        "MSFT dropped to $295.0000 (lower threshold: $300.0000)"
    );
}

#[test]
fn when_summarizing_each_instrument_gets_a_status_row() {
    // Given: One instrument per status
    let ok = instrument("OK").with_upper(200.0).with_lower(100.0).with_initial_value(120.0);
    let high = instrument("HIGH").with_upper(50.0);
    let low = instrument("LOW").with_lower(50.0);
    let unknown = instrument("UNK").with_upper(1.0);
    let prices = priced(&[&ok, &high, &low, &unknown], &[Some(150.0), Some(60.0), Some(40.0), None]);

    // When: Statuses are built
    let statuses = ThresholdEvaluator::new().statuses(&prices, &[ok, high, low, unknown]);

    // Then: Each row carries its state, and change is computed against the initial value
    let states = statuses.iter().map(|status| status.state).collect::<Vec<_>>();
    assert_eq!(
        states,
        vec![
            StatusState::Ok,
            StatusState::AboveUpper,
            StatusState::BelowLower,
            StatusState::Unknown
        ]
    );
    let change = statuses[0].change_pct.expect("initial value set");
    assert!((change - 25.0).abs() < 1e-9);
}
