//! Rendering of backend payloads.

use crate::generators::diagram;
use crate::models::api::GraphPayload;
use serde_json::Value;

/// Cells wider than this are truncated in tables.
const MAX_CELL_WIDTH: usize = 40;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Diagram,
}

/// Render a success payload in the requested format.
///
/// `diagram` only applies to graph payloads; anything else falls back to a table.
pub fn render(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        OutputFormat::Table => render_table(value),
        OutputFormat::Diagram => match as_graph(value) {
            Some(graph) => diagram::generate_mermaid(&graph),
            None => render_table(value),
        },
    }
}

/// Interpret a payload as a graph, if it has nodes.
fn as_graph(value: &Value) -> Option<GraphPayload> {
    let source = value.get("graph").unwrap_or(value);
    let graph: GraphPayload = serde_json::from_value(source.clone()).ok()?;
    (!graph.nodes.is_empty()).then_some(graph)
}

/// Scalars as `key: value` lines, arrays as tables.
pub fn render_table(value: &Value) -> String {
    let Some(object) = value.as_object() else {
        return format!("{}\n", cell_text(value));
    };

    let mut out = String::new();

    for (key, field) in object {
        if key == "status" || field.is_array() || field.is_object() {
            continue;
        }
        out.push_str(&format!("{}: {}\n", key, cell_text(field)));
    }

    for (key, field) in object {
        match field {
            Value::Array(rows) => {
                out.push_str(&format!("\n{} ({})\n", key, rows.len()));
                out.push_str(&rows_table(rows));
            }
            Value::Object(nested) => {
                out.push_str(&format!("\n{}:\n", key));
                for (nested_key, nested_value) in nested {
                    out.push_str(&format!("  {}: {}\n", nested_key, cell_text(nested_value)));
                }
            }
            _ => {}
        }
    }

    out
}

fn rows_table(rows: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        if let Some(object) = row.as_object() {
            for key in object.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    if columns.is_empty() {
        return rows
            .iter()
            .map(|row| format!("  - {}\n", cell_text(row)))
            .collect();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column.to_uppercase(), width = width))
        .collect();
    out.push_str(&format!("  {}\n", header.join("  ").trim_end()));

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", rule.join("  ")));

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(&format!("  {}\n", line.join("  ").trim_end()));
    }

    out
}

/// One-line text for a JSON value, truncated to the cell width.
fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.replace('\n', " "),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };

    if text.chars().count() > MAX_CELL_WIDTH {
        let truncated: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}
