//! Extraction of numeric prices from scraped page text.
//!
//! Scraped prices arrive in many shapes: `$175.50`, `175,50 EUR`,
//! `1.234,56 €`, `1 234,56`. [`extract`] normalizes them to an `f64`.

use std::sync::OnceLock;

use regex::Regex;

const CURRENCY_MARKERS: [&str; 4] = ["$", "€", "USD", "EUR"];

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Space grouping only ahead of the separators, so a trailing number is never joined on.
        Regex::new(r"\d{1,3}(?:[ \u{a0}\u{202f}]\d{3}\b)+(?:[.,]\d+)*|\d+(?:[.,]\d+)*")
            .expect("price pattern is valid")
    })
}

/// Extracts a price from free-form text, or `None` if no usable number is present.
pub fn extract(text: &str) -> Option<f64> {
    let mut cleaned = text.trim().to_owned();
    for marker in CURRENCY_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    let candidate = number_pattern().find(&cleaned)?.as_str();
    let compact = candidate
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{a0}' | '\u{202f}'))
        .collect::<String>();

    let normalized = normalize_separators(&compact);
    let value = normalized.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Resolves decimal vs thousands separators into a plain `123.45` form.
fn normalize_separators(raw: &str) -> String {
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (None, Some(_)) if raw.matches(',').count() > 1 => raw.replace(',', ""),
        (None, Some(_)) => raw.replace(',', "."),
        (Some(_), None) if raw.matches('.').count() > 1 => raw.replace('.', ""),
        _ => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disambiguates_decimal_separator() {
        assert_eq!(extract("1.234,56 EUR"), Some(1234.56));
        assert_eq!(extract("1,234.56"), Some(1234.56));
        assert_eq!(extract("175,50"), Some(175.50));
        assert_eq!(extract("$175.50"), Some(175.50));
    }

    #[test]
    fn strips_currency_and_grouping_spaces() {
        assert_eq!(extract("  1 234,56 €"), Some(1234.56));
        assert_eq!(extract("1\u{202f}234,56\u{a0}€"), Some(1234.56));
        assert_eq!(extract("USD 42"), Some(42.0));
    }

    #[test]
    fn repeated_single_separator_is_grouping() {
        assert_eq!(extract("1,234,567"), Some(1_234_567.0));
        assert_eq!(extract("1.234.567"), Some(1_234_567.0));
    }

    #[test]
    fn takes_first_number_in_text() {
        assert_eq!(extract("189.25 +1.30 (0.69%)"), Some(189.25));
        assert_eq!(extract("175.50 3"), Some(175.50));
    }

    #[test]
    fn number_after_decimal_part_is_not_grouping() {
        assert_eq!(extract("175.50 100"), Some(175.50));
        assert_eq!(extract("42,10 250"), Some(42.10));
        assert_eq!(extract("1 234,56 789"), Some(1234.56));
        assert_eq!(extract("12 345 678"), Some(12_345_678.0));
    }

    #[test]
    fn returns_none_for_non_numeric_text() {
        assert_eq!(extract("not a price"), None);
        assert_eq!(extract(""), None);
        assert_eq!(extract("€"), None);
    }
}
