use std::future::Future;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use tickwatch_core::Monitor;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::CliError;

use super::Context;

pub async fn run(context: &Context) -> Result<ExitCode, CliError> {
    let settings = &context.settings;
    let monitor = context.monitor();

    let instruments = monitor.instruments();
    info!(
        config = %monitor.config_path().display(),
        instruments = instruments.len(),
        check_interval_secs = settings.check_interval.as_secs(),
        summary_interval_secs = settings.summary_interval.as_secs(),
        pacing_secs = monitor.fetcher().pacing().as_secs(),
        mode = ?settings.fetch_mode,
        "monitor starting"
    );
    for instrument in &instruments {
        info!(
            symbol = %instrument.symbol,
            name = %instrument.label(),
            upper = ?instrument.active_upper(),
            lower = ?instrument.active_lower(),
            "tracking instrument"
        );
    }

    schedule(
        &monitor,
        settings.check_interval,
        settings.summary_interval,
        tokio::signal::ctrl_c(),
    )
    .await;
    Ok(ExitCode::SUCCESS)
}

/// Checks immediately and then every `check_every`; summaries start one
/// `summary_every` after launch. Returns once `shutdown` resolves, abandoning
/// any cycle still in flight.
async fn schedule<S>(monitor: &Monitor, check_every: Duration, summary_every: Duration, shutdown: S)
where
    S: Future<Output = io::Result<()>>,
{
    let mut checks = interval(check_every);
    checks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summaries = interval_at(Instant::now() + summary_every, summary_every);
    summaries.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => return stopped(result),
            _ = checks.tick() => {
                tokio::select! {
                    outcome = monitor.check_cycle() => info!(outcome = ?outcome, "check cycle finished"),
                    result = &mut shutdown => return stopped(result),
                }
            }
            _ = summaries.tick() => {
                tokio::select! {
                    outcome = monitor.summary_cycle() => info!(outcome = ?outcome, "summary cycle finished"),
                    result = &mut shutdown => return stopped(result),
                }
            }
        }
    }
}

fn stopped(result: io::Result<()>) {
    if let Err(error) = result {
        warn!(error = %error, "ctrl-c handler failed");
    }
    info!("monitor stopped");
}

#[cfg(test)]
mod tests {
    use std::future::{pending, Future};
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tickwatch_core::{BatchPriceFetcher, LogNotifier, RecordingSleeper, Symbol, SymbolFetcher};

    use super::*;

    /// Never returns a price, like a fetch stuck in backoff.
    #[derive(Default)]
    struct StuckFetcher {
        calls: AtomicUsize,
    }

    impl SymbolFetcher for StuckFetcher {
        fn fetch_price<'a>(
            &'a self,
            _symbol: &'a Symbol,
            _display_name: &'a str,
        ) -> Pin<Box<dyn Future<Output = Option<f64>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(pending())
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_running_check_cycle() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = dir.path().join("stocks.json");
        std::fs::write(&config, r#"{"stocks":[{"symbol":"AAPL","upper_threshold":200}]}"#)
            .expect("config written");
        let fetcher = Arc::new(StuckFetcher::default());
        let batch = BatchPriceFetcher::new(fetcher.clone(), Arc::new(RecordingSleeper::new()));
        let monitor = Monitor::new(config, batch, Arc::new(LogNotifier));

        let shutdown = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        };
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            schedule(&monitor, Duration::from_secs(3600), Duration::from_secs(3600), shutdown),
        )
        .await;

        assert!(finished.is_ok(), "scheduler kept waiting on the stuck cycle");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
