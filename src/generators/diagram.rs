//! Mermaid diagram generator for knowledge-graph payloads.

use crate::models::api::GraphPayload;
use std::collections::HashMap;

/// Generate a Mermaid flowchart.
///
/// Node ids from the backend are replaced by `n0`, `n1`, ... because
/// Mermaid ids cannot contain arbitrary characters. Edges that mention
/// unknown nodes get a node of their own.
pub fn generate_mermaid(graph: &GraphPayload) -> String {
    let mut ids: HashMap<&str, String> = HashMap::new();
    let mut diagram = String::from("graph TD\n");

    for node in &graph.nodes {
        if ids.contains_key(node.id.as_str()) {
            continue;
        }
        let key = format!("n{}", ids.len());
        let mut label = node.label.clone().unwrap_or_else(|| node.id.clone());
        if let Some(ref node_type) = node.node_type {
            label.push_str(&format!(" ({})", node_type));
        }
        diagram.push_str(&format!("    {}[\"{}\"]\n", key, escape_label(&label)));
        ids.insert(node.id.as_str(), key);
    }

    for edge in &graph.edges {
        for id in [edge.source.as_str(), edge.target.as_str()] {
            if !ids.contains_key(id) {
                let key = format!("n{}", ids.len());
                diagram.push_str(&format!("    {}[\"{}\"]\n", key, escape_label(id)));
                ids.insert(id, key);
            }
        }
    }

    for edge in &graph.edges {
        let (Some(source), Some(target)) = (ids.get(edge.source.as_str()), ids.get(edge.target.as_str()))
        else {
            continue;
        };
        match edge.label {
            Some(ref label) if !label.is_empty() => diagram.push_str(&format!(
                "    {} -->|{}| {}\n",
                source,
                escape_label(label),
                target
            )),
            _ => diagram.push_str(&format!("    {} --> {}\n", source, target)),
        }
    }

    diagram
}

/// Escape characters Mermaid treats specially inside labels.
fn escape_label(label: &str) -> String {
    label
        .replace('"', "#quot;")
        .replace('|', "#124;")
        .replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api::{GraphEdge, GraphNode};

    #[test]
    fn test_generate_mermaid() {
        let graph = GraphPayload {
            nodes: vec![
                GraphNode {
                    id: "mem-1".to_string(),
                    label: Some("Auth \"service\"".to_string()),
                    node_type: Some("component".to_string()),
                },
                GraphNode {
                    id: "mem-2".to_string(),
                    label: None,
                    node_type: None,
                },
            ],
            edges: vec![
                GraphEdge {
                    source: "mem-1".to_string(),
                    target: "mem-2".to_string(),
                    label: Some("uses".to_string()),
                },
                GraphEdge {
                    source: "mem-2".to_string(),
                    target: "mem-9".to_string(),
                    label: None,
                },
            ],
        };

        let diagram = generate_mermaid(&graph);
        assert!(diagram.starts_with("graph TD\n"));
        assert!(diagram.contains("n0[\"Auth #quot;service#quot; (component)\"]"));
        assert!(diagram.contains("n1[\"mem-2\"]"));
        assert!(diagram.contains("n2[\"mem-9\"]"));
        assert!(diagram.contains("n0 -->|uses| n1"));
        assert!(diagram.contains("n1 --> n2"));
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(generate_mermaid(&GraphPayload::default()), "graph TD\n");
    }
}
