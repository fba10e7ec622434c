//! User-facing output.
//!
//! Backend payloads and repository text such as commit messages go through
//! [`SafeOutput`], which runs them through the abstraction engine first and
//! flags text whose safety score falls under the configured threshold. Fixed
//! headings and local status lines are printed directly.

pub mod format;

use crate::core::abstraction::{AbstractionEngine, AbstractionResult};
use colored::Colorize;
use format::OutputFormat;
use serde_json::Value;

/// Destination for output lines.
pub trait OutputSink {
    fn write_line(&mut self, line: &str);

    fn warn(&mut self, line: &str) {
        self.write_line(line);
    }
}

/// Writes to stdout; warnings go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn warn(&mut self, line: &str) {
        eprintln!("{} {}", "[WARNING]".yellow(), line);
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
}

impl OutputSink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn warn(&mut self, line: &str) {
        self.warnings.push(line.to_string());
    }
}

/// Abstracting wrapper around an [`OutputSink`].
pub struct SafeOutput<S: OutputSink> {
    sink: S,
    engine: AbstractionEngine,
    threshold: f64,
}

impl<S: OutputSink> SafeOutput<S> {
    pub fn new(sink: S, engine: AbstractionEngine, threshold: f64) -> Self {
        Self {
            sink,
            engine,
            threshold,
        }
    }

    /// Abstract `text` and write it line by line.
    pub fn emit(&mut self, text: &str) -> AbstractionResult {
        let result = self.engine.process(text);
        self.write_checked(&result.content, result.safety_score, result.mappings);
        result
    }

    /// Render a payload and write it. Returns the combined safety score.
    ///
    /// String values are abstracted before rendering, since table cells are
    /// truncated and a cut-off secret no longer matches any rule.
    pub fn emit_value(&mut self, value: &Value, output_format: OutputFormat) -> f64 {
        let mut penalty = 0.0;
        let mut mappings = 0;
        let abstracted = self.abstract_value(value, &mut penalty, &mut mappings);

        let rendered = self.engine.process(&format::render(&abstracted, output_format));
        penalty += 1.0 - rendered.safety_score;
        mappings += rendered.mappings;

        let score = (1.0 - penalty).clamp(0.0, 1.0);
        self.write_checked(&rendered.content, score, mappings);
        score
    }

    fn abstract_value(&self, value: &Value, penalty: &mut f64, mappings: &mut usize) -> Value {
        match value {
            Value::String(text) => {
                let result = self.engine.process(text);
                *penalty += 1.0 - result.safety_score;
                *mappings += result.mappings;
                Value::String(result.content)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.abstract_value(item, penalty, mappings))
                    .collect(),
            ),
            Value::Object(object) => Value::Object(
                object
                    .iter()
                    .map(|(key, item)| (key.clone(), self.abstract_value(item, penalty, mappings)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn write_checked(&mut self, content: &str, safety_score: f64, mappings: usize) {
        if safety_score < self.threshold {
            self.sink.warn(&format!(
                "Output contained sensitive content (safety score {:.2}); {} value(s) abstracted",
                safety_score, mappings
            ));
        }

        for line in content.lines() {
            self.sink.write_line(line);
        }
    }

    /// Write text that has already been checked, such as fixed headings.
    pub fn emit_raw(&mut self, line: &str) {
        self.sink.write_line(line);
    }

    pub fn engine(&self) -> &AbstractionEngine {
        &self.engine
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}
