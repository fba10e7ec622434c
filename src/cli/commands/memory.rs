//! Memory command implementations.

use super::{backend, report_outcome};
use crate::models::api::{MemoryRequest, SearchRequest};
use crate::models::config::Config;
use crate::output::format::OutputFormat;
use crate::Result;
use colored::Colorize;

/// Store a memory.
pub async fn store(
    content: &str,
    memory_type: &str,
    tags: Vec<String>,
    importance: Option<f32>,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    if let Some(importance) = importance {
        if !(0.0..=1.0).contains(&importance) {
            return Err(crate::Error::other(format!(
                "Importance must be between 0 and 1, got {}",
                importance
            )));
        }
    }

    let (client, mut output) = backend(config)?;

    // Check what is about to leave the machine
    let scan = output.engine().process(content);
    if !scan.is_safe(config.output.safety_threshold) {
        println!(
            "{} Memory content looks sensitive (safety score {:.2}); storing the abstracted form",
            "[WARNING]".yellow(),
            scan.safety_score
        );
    }

    let request = MemoryRequest {
        content: scan.content,
        memory_type: memory_type.to_string(),
        tags,
        importance,
    };
    let outcome = client.store_memory(&request).await?;
    Ok(report_outcome(outcome, "memory", format, &mut output))
}

/// Show one memory.
pub async fn get(id: &str, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.get_memory(id).await?;
    Ok(report_outcome(outcome, &format!("memory {}", id), format, &mut output))
}

/// List memories.
pub async fn list(
    limit: usize,
    memory_type: Option<&str>,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.list_memories(limit, memory_type).await?;
    Ok(report_outcome(outcome, "memories", format, &mut output))
}

/// Search memories.
pub async fn search(
    query: &str,
    limit: usize,
    memory_type: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let request = SearchRequest {
        query: query.to_string(),
        limit,
        memory_type,
    };
    let outcome = client.search_memories(&request).await?;
    Ok(report_outcome(outcome, "search results", format, &mut output))
}

/// Delete a memory.
pub async fn delete(id: &str, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.delete_memory(id).await?;
    Ok(report_outcome(outcome, &format!("memory {}", id), format, &mut output))
}
