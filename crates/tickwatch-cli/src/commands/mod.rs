mod check;
mod quote;
mod run;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use tickwatch_core::{
    FetchMode, HttpClient, LogNotifier, Monitor, ReqwestHttpClient, Settings, Sleeper, TokioSleeper,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Process-wide collaborators, built once and handed to each command.
pub struct Context {
    pub settings: Settings,
    pub http_client: Arc<dyn HttpClient>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let settings = apply_overrides(cli, Settings::from_env()?);
        Ok(Self {
            settings,
            http_client: Arc::new(ReqwestHttpClient::new()),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn monitor(&self) -> Monitor {
        Monitor::from_settings(
            &self.settings,
            self.http_client.clone(),
            self.sleeper.clone(),
            Arc::new(LogNotifier),
        )
    }
}

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let context = Context::from_cli(cli)?;

    match &cli.command {
        Command::Run => run::run(&context).await,
        Command::Check => check::run(&context, cli.pretty).await,
        Command::Summary => summary::run(&context, cli.pretty).await,
        Command::Quote(args) => quote::run(args, &context, cli.pretty).await,
    }
}

/// Command-line flags win over the environment.
fn apply_overrides(cli: &Cli, mut settings: Settings) -> Settings {
    if let Some(path) = &cli.config {
        settings.config_path = path.clone();
    }
    if cli.scrape {
        settings.fetch_mode = FetchMode::ScrapingFirst;
    }
    if let Some(retries) = cli.retries {
        settings.retry_count = retries.max(1);
    }
    settings
}
