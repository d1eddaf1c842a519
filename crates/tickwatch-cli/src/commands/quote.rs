use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use tickwatch_core::{price_fetcher, BatchPriceFetcher, Symbol, WatchConfig};

use crate::cli::QuoteArgs;
use crate::error::CliError;
use crate::output;

use super::Context;

/// Prints `{symbol: price|null}`; exits 3 when any price is missing.
pub async fn run(args: &QuoteArgs, context: &Context, pretty: bool) -> Result<ExitCode, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let config = WatchConfig::load_or_empty(&context.settings.config_path);
    let names = config
        .instruments
        .iter()
        .filter_map(|instrument| {
            instrument
                .display_name
                .clone()
                .map(|name| (instrument.symbol.clone(), name))
        })
        .collect::<HashMap<_, _>>();

    let fetcher = price_fetcher(
        &context.settings,
        config.selectors,
        context.http_client.clone(),
        context.sleeper.clone(),
    );
    let batch = BatchPriceFetcher::new(Arc::new(fetcher), context.sleeper.clone());
    let prices = batch.fetch_all(&symbols, &names).await;

    output::render(&prices, pretty)?;
    if prices.missing().next().is_some() {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
