//! Abstract command implementation.

use crate::core::abstraction::{AbstractionEngine, AbstractionResult};
use crate::models::config::Config;
use crate::output::format::OutputFormat;
use crate::utils::fs as fs_utils;
use crate::Result;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Score of one scanned file.
#[derive(Debug, Clone, Serialize)]
pub struct FileScore {
    pub path: PathBuf,
    pub safety_score: f64,
    pub mappings: usize,
}

/// Abstract text given on the command line.
pub async fn abstract_text(text: &str, config: &Config, format: OutputFormat) -> Result<bool> {
    let engine = AbstractionEngine::from_config(&config.output);
    let result = engine.process(text);
    print_result(&result, config.output.safety_threshold, format)?;
    Ok(true)
}

/// Abstract a file, or score every text file below a directory.
pub async fn abstract_path(path: &Path, config: &Config, format: OutputFormat) -> Result<bool> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }

    let engine = AbstractionEngine::from_config(&config.output);

    if path.is_file() {
        let content = fs::read_to_string(path)?;
        let result = engine.process(&content);
        print_result(&result, config.output.safety_threshold, format)?;
        return Ok(true);
    }

    let scores = scan_directory(&engine, path)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(true);
    }

    println!("{}", "[ABSTRACT] Directory scan".bold().cyan());
    println!();
    println!("[INFO] Scanned {} files", scores.len());
    println!();

    let flagged: Vec<_> = scores
        .iter()
        .filter(|s| s.safety_score < config.output.safety_threshold)
        .collect();
    if flagged.is_empty() {
        println!("{}", "[OK] No files below the safety threshold".green());
        return Ok(true);
    }

    println!("{:>7} {:>9}  {}", "SCORE".bold(), "MATCHES".bold(), "FILE".bold());
    for score in &flagged {
        let relative = score.path.strip_prefix(path).unwrap_or(&score.path);
        println!(
            "{:>7.2} {:>9}  {}",
            score.safety_score,
            score.mappings,
            relative.display()
        );
    }
    println!();
    println!(
        "{} {} file(s) below safety threshold {:.2}",
        "[WARNING]".yellow(),
        flagged.len(),
        config.output.safety_threshold
    );
    Ok(true)
}

/// Score every text file below `root`, least safe first.
pub fn scan_directory(engine: &AbstractionEngine, root: &Path) -> Result<Vec<FileScore>> {
    let mut scores = Vec::new();

    for path in fs_utils::collect_text_files(root)? {
        // Non-UTF-8 content is treated as binary
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        let result = engine.process(&content);
        scores.push(FileScore {
            path,
            safety_score: result.safety_score,
            mappings: result.mappings,
        });
    }

    scores.sort_by(|a, b| a.safety_score.total_cmp(&b.safety_score));
    Ok(scores)
}

fn print_result(result: &AbstractionResult, threshold: f64, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{}", result.content);
    println!();

    let score = format!("{:.2}", result.safety_score);
    let score = if result.is_safe(threshold) {
        score.green()
    } else {
        score.red()
    };
    println!("  {} {}", "Safety score:".bold(), score);
    println!("  {} {}", "Substitutions:".bold(), result.mappings);
    for (category, count) in &result.categories {
        println!("    - {}: {}", category, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_directory_orders_by_score() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("notes.md"), "Plain notes about the design").unwrap();
        fs::write(root.join("settings.env"), "API_KEY=abcd1234efgh\nDB_PASSWORD=hunter2\n").unwrap();

        let scores = scan_directory(&AbstractionEngine::default(), root).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0].path.ends_with("settings.env"));
        assert_eq!(scores[0].mappings, 2);
        assert!((scores[0].safety_score - 0.5).abs() < 1e-9);
        assert_eq!(scores[1].safety_score, 1.0);
    }
}
