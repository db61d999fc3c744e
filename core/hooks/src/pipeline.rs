//! Ordered execution of hook command lists.
use anyhow::Result;
use slog::debug;
use slog::info;
use slog::warn;

use replimend_context::Context;
use replimend_models::AnalysisEntry;
use replimend_models::Instance;

use super::expand_placeholders;
use super::HookFailed;
use super::ProcessRunner;

/// Expand and run a list of hook commands in order.
///
/// With `fail_on_error` the first failure aborts the remainder of the list
/// and is returned immediately. Without it every command runs and the first
/// observed failure is returned once the whole list completed.
pub async fn run_processes(
    context: &Context,
    runner: &ProcessRunner,
    commands: &[String],
    phase: &str,
    entry: &AnalysisEntry,
    successor: Option<&Instance>,
    fail_on_error: bool,
) -> Result<()> {
    let mut first_error = None;
    for (index, command) in commands.iter().enumerate() {
        let expanded = expand_placeholders(command, entry, successor);
        info!(
            context.logger, "Running {} hook", phase;
            "index" => index, "failed" => %entry.analyzed_key,
        );
        let failure = match runner.run(context, &expanded).await {
            Ok(0) => {
                debug!(context.logger, "Hook completed"; "phase" => phase, "index" => index);
                None
            }
            Ok(status) => Some(anyhow::Error::new(HookFailed::new(
                phase,
                expanded.as_str(),
                status,
            ))),
            Err(error) => Some(error),
        };
        if let Some(error) = failure {
            warn!(
                context.logger, "Hook failed";
                "phase" => phase, "index" => index, "error" => %error,
            );
            if fail_on_error {
                return Err(error);
            }
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
