//! Text and HTML rendering of alerts and summaries.

use std::fmt::Write;

use crate::{InstrumentStatus, StatusState, Violation};

pub const SUMMARY_SUBJECT: &str = "Stock Price Summary - Daily Report";

const RULE_WIDTH: usize = 50;
const ALERT_FOOTER: &str = "This is an automated alert from tickwatch.";
const SUMMARY_FOOTER: &str = "This is an automated daily summary from tickwatch.";

pub fn alert_subject(violations: &[Violation]) -> String {
    format!("Stock Alert: {} Threshold(s) Crossed", violations.len())
}

pub fn alert_body(violations: &[Violation]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let separator = "-".repeat(RULE_WIDTH);
    let mut body = format!("Stock Threshold Alert\n{rule}\n\n");

    for violation in violations {
        let _ = writeln!(body, "Stock: {}", violation.display_name);
        let _ = writeln!(body, "Current Price: {:.4}", violation.current_price);
        let _ = writeln!(
            body,
            "Threshold ({}): {:.4}",
            violation.threshold_kind, violation.threshold
        );
        let _ = writeln!(body, "Status: {}", violation.message);
        let _ = writeln!(body, "{separator}\n");
    }

    let _ = writeln!(body, "\n{ALERT_FOOTER}");
    body
}

pub fn summary_text(statuses: &[InstrumentStatus]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let separator = "-".repeat(RULE_WIDTH);
    let mut body = format!("{SUMMARY_SUBJECT}\n{rule}\n\n");

    for status in statuses {
        let _ = writeln!(body, "Stock: {}", status.display_name);
        let _ = writeln!(body, "Current Price: {}", price_text(status.price));
        let _ = writeln!(body, "Upper Threshold: {}", threshold_text(status.upper_threshold));
        let _ = writeln!(body, "Lower Threshold: {}", threshold_text(status.lower_threshold));
        if let Some(change) = status.change_pct {
            let _ = writeln!(body, "Change: {change:+.2}%");
        }
        if status.price.is_some() {
            let _ = writeln!(body, "Status: {}", status_line(status.state));
        }
        let _ = writeln!(body, "{separator}\n");
    }

    let _ = writeln!(body, "\n{SUMMARY_FOOTER}");
    body
}

pub fn summary_html(statuses: &[InstrumentStatus]) -> String {
    let mut html = String::from(
        "<html>\n<head>\n<style>\n\
         body { font-family: 'Courier New', monospace; font-size: 14px; }\n\
         .header { font-weight: bold; font-size: 16px; margin-bottom: 20px; }\n\
         .stock-ok { color: #0066cc; margin: 5px 0; }\n\
         .stock-alert { color: #cc0000; margin: 5px 0; }\n\
         .footer { margin-top: 20px; font-size: 12px; color: #666; }\n\
         </style>\n</head>\n<body>\n",
    );
    let _ = writeln!(html, "<div class=\"header\">{SUMMARY_SUBJECT}</div>");

    for status in statuses {
        let name = escape_html(&status.display_name);
        let bounds = format!(
            "(Upper: {}, Lower: {})",
            threshold_text(status.upper_threshold),
            threshold_text(status.lower_threshold)
        );

        match status.price {
            Some(price) => {
                let alert = status.state.is_alert();
                let class = if alert { "stock-alert" } else { "stock-ok" };
                let marker = if alert { "[ALERT]" } else { "[OK]" };
                let _ = writeln!(
                    html,
                    "<div class=\"{class}\">{name}: {price:.4} {marker} {bounds}</div>"
                );
            }
            None => {
                let _ = writeln!(html, "<div class=\"stock-ok\">{name}: N/A {bounds}</div>");
            }
        }
    }

    let _ = writeln!(html, "<div class=\"footer\">{SUMMARY_FOOTER}</div>\n</body>\n</html>");
    html
}

fn price_text(price: Option<f64>) -> String {
    price.map_or_else(|| String::from("N/A"), |price| format!("{price:.4}"))
}

fn threshold_text(threshold: Option<f64>) -> String {
    threshold
        .filter(|value| *value > 0.0)
        .map_or_else(|| String::from("Not set"), |value| format!("{value:.4}"))
}

fn status_line(state: StatusState) -> &'static str {
    match state {
        StatusState::AboveUpper => "ALERT - Above upper threshold",
        StatusState::BelowLower => "ALERT - Below lower threshold",
        StatusState::Ok | StatusState::Unknown => "OK",
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
