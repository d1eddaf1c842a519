use std::future::Future;
use std::pin::Pin;

use tracing::{debug, info};

use crate::{report, InstrumentStatus, Violation};

/// Delivers alerts and summaries. Returns whether delivery succeeded and never panics.
pub trait Notifier: Send + Sync {
    fn send_alert<'a>(
        &'a self,
        violations: &'a [Violation],
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

    fn send_summary<'a>(
        &'a self,
        statuses: &'a [InstrumentStatus],
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Writes rendered reports to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_alert<'a>(
        &'a self,
        violations: &'a [Violation],
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            if violations.is_empty() {
                info!("no violations to report");
                return true;
            }

            info!(
                violations = violations.len(),
                subject = %report::alert_subject(violations),
                "\n{}",
                report::alert_body(violations)
            );
            true
        })
    }

    fn send_summary<'a>(
        &'a self,
        statuses: &'a [InstrumentStatus],
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            if statuses.is_empty() {
                info!("no instruments to summarize");
                return true;
            }

            info!(
                instruments = statuses.len(),
                subject = report::SUMMARY_SUBJECT,
                "\n{}",
                report::summary_text(statuses)
            );
            debug!(html = %report::summary_html(statuses), "summary html");
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_is_successful_no_op() {
        assert!(LogNotifier.send_alert(&[]).await);
        assert!(LogNotifier.send_summary(&[]).await);
    }
}
