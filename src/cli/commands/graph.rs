//! Knowledge graph command implementations.

use super::{backend, report_outcome};
use crate::generators::diagram;
use crate::models::api::{ApiOutcome, GraphPayload, GraphQueryRequest};
use crate::models::config::Config;
use crate::output::format::OutputFormat;
use crate::output::{OutputSink, SafeOutput};
use crate::Result;
use serde_json::Value;

/// Build the graph from stored memories.
pub async fn build(rebuild: bool, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.build_graph(rebuild).await?;
    Ok(report_outcome(outcome, "graph", format, &mut output))
}

/// Query the graph.
pub async fn query(
    query: &str,
    depth: Option<u32>,
    limit: Option<usize>,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let request = GraphQueryRequest {
        query: query.to_string(),
        depth,
        limit,
    };
    let outcome = client.query_graph(&request).await?;
    Ok(report_outcome(outcome, "graph results", format, &mut output))
}

/// Export the whole graph. `--format diagram` renders it as Mermaid.
pub async fn export(export_format: &str, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let outcome = client.export_graph(export_format).await?;
    if format == OutputFormat::Diagram {
        report_diagram(outcome, &mut output)?;
        return Ok(true);
    }
    Ok(report_outcome(outcome, "graph", format, &mut output))
}

/// Decode an export as a graph and print it as Mermaid.
///
/// The graph may be the body itself or nested under `graph`. A payload that
/// is not a graph, or a failed export, is an error.
fn report_diagram<S: OutputSink>(
    outcome: ApiOutcome<Value>,
    output: &mut SafeOutput<S>,
) -> Result<()> {
    let outcome = match outcome {
        ApiOutcome::Success(Value::Object(mut body)) if body.contains_key("graph") => {
            ApiOutcome::Success(body.remove("graph").unwrap_or_default())
        }
        other => other,
    };
    let graph: GraphPayload = outcome.decode()?.into_result("graph")?;
    output.emit(&diagram::generate_mermaid(&graph));
    Ok(())
}

/// Extract the subgraph around a concept.
pub async fn subgraph(query: &str, depth: u32, config: &Config, format: OutputFormat) -> Result<bool> {
    let (client, mut output) = backend(config)?;
    let request = GraphQueryRequest {
        query: query.to_string(),
        depth: Some(depth),
        limit: None,
    };
    let outcome = client.subgraph(&request).await?;
    Ok(report_outcome(outcome, &format!("subgraph for '{}'", query), format, &mut output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::abstraction::AbstractionEngine;
    use crate::output::MemorySink;
    use serde_json::json;

    fn output() -> SafeOutput<MemorySink> {
        SafeOutput::new(MemorySink::default(), AbstractionEngine::default(), 0.7)
    }

    #[test]
    fn test_diagram_from_nested_graph() {
        let mut out = output();
        let outcome = ApiOutcome::Success(json!({
            "status": "success",
            "graph": {
                "nodes": [{"id": "a", "label": "Auth"}, {"id": "b", "label": "Owner ops@corp.io"}],
                "edges": [{"source": "a", "target": "b", "label": "uses"}]
            }
        }));

        report_diagram(outcome, &mut out).unwrap();

        let lines = out.into_inner().lines;
        assert_eq!(lines[0], "graph TD");
        assert!(lines.iter().any(|l| l.contains("Auth")));
        assert!(lines.iter().any(|l| l.contains("<email>")));
        assert!(!lines.iter().any(|l| l.contains("ops@corp.io")));
    }

    #[test]
    fn test_diagram_from_top_level_graph() {
        let mut out = output();
        let outcome = ApiOutcome::Success(json!({
            "status": "success",
            "nodes": [{"id": "a"}],
            "edges": []
        }));
        report_diagram(outcome, &mut out).unwrap();
        assert_eq!(out.into_inner().lines[0], "graph TD");
    }

    #[test]
    fn test_diagram_of_failed_export_is_an_error() {
        let mut out = output();
        let err = report_diagram(ApiOutcome::NotFound, &mut out).unwrap_err();
        assert!(matches!(err, crate::Error::ApiNotFound(_)));

        let failed = ApiOutcome::Failed {
            message: "graph not built".to_string(),
            details: None,
        };
        let err = report_diagram(failed, &mut out).unwrap_err();
        assert!(matches!(err, crate::Error::Api { .. }));

        let not_a_graph = ApiOutcome::Success(json!({"status": "success", "nodes": "oops"}));
        assert!(report_diagram(not_a_graph, &mut out).is_err());
        assert!(out.into_inner().lines.is_empty());
    }
}
