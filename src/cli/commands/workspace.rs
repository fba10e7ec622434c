//! Vault, documentation and checkpoint commands.

use super::{backend, report_outcome};
use crate::models::config::Config;
use crate::output::format::OutputFormat;
use crate::Result;

/// Sync memories with the notes vault.
pub async fn vault_sync(path: Option<&str>, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.sync_vault(path).await?;
    Ok(report_outcome(outcome, "vault", format, &mut output))
}

/// Generate documentation for a target.
pub async fn docs_generate(
    target: &str,
    doc_type: &str,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.generate_docs(target, doc_type).await?;
    Ok(report_outcome(outcome, &format!("documentation target '{}'", target), format, &mut output))
}

/// Record a checkpoint.
pub async fn checkpoint_create(
    message: &str,
    tags: &[String],
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.create_checkpoint(message, tags).await?;
    Ok(report_outcome(outcome, "checkpoint", format, &mut output))
}
