//! Integration tests for content abstraction
//!
//! Tests cover:
//! - Credential detection and scoring
//! - Safe text passthrough
//! - Idempotence on already abstracted text
//! - Custom patterns from configuration
//! - Guarded output and directory scanning

use cognitive_partner::cli::commands::abstraction::scan_directory;
use cognitive_partner::core::abstraction::AbstractionEngine;
use cognitive_partner::models::config::{CustomPattern, OutputConfig};
use cognitive_partner::output::{MemorySink, SafeOutput};
use std::fs;
use tempfile::TempDir;

const SECRET_TEXT: &str = "Connect with password=hunter2 and token: abcdef123456";

// ========== SCORING TESTS ==========

#[test]
fn test_credentials_lower_the_score() {
    let engine = AbstractionEngine::default();
    let result = engine.process(SECRET_TEXT);

    assert!(result.safety_score < 0.8);
    assert!(!result.content.contains("hunter2"));
    assert!(!result.content.contains("abcdef123456"));
    assert!(result.content.contains("password=<credential>"));
    assert_eq!(result.mappings, 2);
}

#[test]
fn test_safe_text_passes_through() {
    let engine = AbstractionEngine::default();
    let text = "Refactor the planner so risk factors are collected in one pass.";
    let result = engine.process(text);

    assert!(result.safety_score > 0.9);
    assert_eq!(result.content, text);
    assert!(!result.has_changes);
    assert!(result.categories.is_empty());
}

#[test]
fn test_processing_is_idempotent() {
    let engine = AbstractionEngine::default();
    let text = "Deploy to https://deploy.example.com from /home/dev/app with \
                DB_PASSWORD=s3cret; contact ops@example.com (10.0.0.12)";

    let first = engine.process(text);
    let second = engine.process(&first.content);

    assert!(first.has_changes);
    assert_eq!(second.content, first.content);
    assert_eq!(second.mappings, 0);
    assert_eq!(second.safety_score, 1.0);
}

// ========== CONFIGURATION TESTS ==========

#[test]
fn test_custom_pattern_from_config() {
    let config = OutputConfig {
        custom_patterns: vec![CustomPattern {
            name: "customer".to_string(),
            pattern: r"CUST-\d{6}".to_string(),
            placeholder: "<customer_id>".to_string(),
            weight: 0.2,
        }],
        ..Default::default()
    };
    let engine = AbstractionEngine::from_config(&config);

    let result = engine.process("Ticket for CUST-004211 reopened");
    assert_eq!(result.content, "Ticket for <customer_id> reopened");
    assert!((result.safety_score - 0.8).abs() < 1e-9);
}

#[test]
fn test_invalid_custom_pattern_is_skipped() {
    let config = OutputConfig {
        custom_patterns: vec![CustomPattern {
            name: "broken".to_string(),
            pattern: "([unclosed".to_string(),
            placeholder: "<x>".to_string(),
            weight: 0.1,
        }],
        ..Default::default()
    };
    let engine = AbstractionEngine::from_config(&config);

    assert_eq!(engine.table().len(), AbstractionEngine::default().table().len());
}

// ========== OUTPUT TESTS ==========

#[test]
fn test_safe_output_warns_on_unsafe_text() {
    let mut output = SafeOutput::new(MemorySink::default(), AbstractionEngine::default(), 0.7);

    output.emit("All checks passed");
    output.emit(SECRET_TEXT);

    let sink = output.into_inner();
    assert_eq!(sink.lines.len(), 2);
    assert_eq!(sink.lines[0], "All checks passed");
    assert!(!sink.lines[1].contains("hunter2"));
    assert_eq!(sink.warnings.len(), 1);
}

// ========== DIRECTORY SCAN TESTS ==========

#[test]
fn test_scan_directory_skips_ignored_and_binary_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::write(root.join("config.env"), "API_KEY=abcd1234efgh\n").unwrap();
    fs::write(root.join("README.md"), "Project notes").unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git/config"), "password=ignored-secret").unwrap();
    fs::create_dir_all(root.join("target")).unwrap();
    fs::write(root.join("target/out.txt"), "token=ignored-secret").unwrap();
    fs::write(root.join("image.png"), [0x89, b'P', b'N', b'G', 0, 0, 0]).unwrap();

    let scores = scan_directory(&AbstractionEngine::default(), root).unwrap();

    assert_eq!(scores.len(), 2);
    assert!(scores[0].path.ends_with("config.env"));
    assert!(scores[0].safety_score < 1.0);
    assert!(scores[1].path.ends_with("README.md"));
}
