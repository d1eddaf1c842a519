use std::process::ExitCode;

use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn run(context: &Context, pretty: bool) -> Result<ExitCode, CliError> {
    let outcome = context.monitor().check_cycle().await;
    output::render(&outcome, pretty)?;
    Ok(ExitCode::SUCCESS)
}
