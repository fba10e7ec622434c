//! CLI command implementations.

pub mod abstraction;
pub mod graph;
pub mod memory;
pub mod monitor;
pub mod rollback;
pub mod workspace;

use crate::core::abstraction::AbstractionEngine;
use crate::models::api::ApiOutcome;
use crate::models::config::Config;
use crate::output::format::OutputFormat;
use crate::output::{ConsoleSink, OutputSink, SafeOutput};
use crate::services::api::ApiClient;
use crate::Result;
use colored::Colorize;
use serde_json::Value;

/// Build the API client and the abstracting console output.
pub(crate) fn backend(config: &Config) -> Result<(ApiClient, SafeOutput<ConsoleSink>)> {
    let client = ApiClient::with_config(config.api.clone())?;
    let output = SafeOutput::new(
        ConsoleSink,
        AbstractionEngine::from_config(&config.output),
        config.output.safety_threshold,
    );
    Ok((client, output))
}

/// Print a backend outcome. Returns whether it was a success.
pub(crate) fn report_outcome<S: OutputSink>(
    outcome: ApiOutcome<Value>,
    what: &str,
    format: OutputFormat,
    output: &mut SafeOutput<S>,
) -> bool {
    match outcome {
        ApiOutcome::Success(value) => {
            output.emit_value(&value, format);
            true
        }
        ApiOutcome::NotFound => {
            output.emit_raw(&format!("{} {} not found", "[NOT FOUND]".yellow(), what));
            false
        }
        ApiOutcome::Failed { message, details } => {
            output.emit(&format!("{} {}", "[ERROR]".red(), message));
            if let Some(details) = details {
                output.emit(&format!("  details: {}", details));
            }
            false
        }
    }
}
