use std::process::ExitCode;

use tickwatch_core::SummaryOutcome;

use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn run(context: &Context, pretty: bool) -> Result<ExitCode, CliError> {
    let outcome = context.monitor().summary_cycle().await;
    output::render(&outcome, pretty)?;

    match outcome {
        SummaryOutcome::Sent {
            delivered: false, ..
        } => Ok(ExitCode::from(3)),
        _ => Ok(ExitCode::SUCCESS),
    }
}
