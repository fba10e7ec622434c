//! Configuration model.
//!
//! Loaded from `<config_dir>/cognitive_partner/config.toml`. Every section
//! has defaults, so partial files are fine. API settings can be overridden
//! with `PARTNER_API_URL`, `PARTNER_API_TOKEN` and `PARTNER_API_TIMEOUT`.

use crate::models::monitor::AlertThresholds;
use crate::models::rollback::RiskWeights;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API configuration.
    pub api: ApiConfig,
    /// Rollback configuration.
    pub rollback: RollbackConfig,
    /// Monitoring configuration.
    pub monitor: MonitorConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend.
    pub base_url: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u64,
}

/// Rollback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Directory for rollback reports.
    pub logs_dir: PathBuf,
    /// Path substrings that mark a file as critical.
    pub critical_paths: Vec<String>,
    /// Targets older than this produce a warning.
    pub max_target_age_days: i64,
    /// Files that must be readable after a rollback. When empty, the
    /// manifests in [`DEFAULT_SMOKE_PATHS`] tracked at the target are used.
    pub smoke_paths: Vec<PathBuf>,
    /// Changed files scoring below this are reported after a rollback.
    pub scan_safety_threshold: f64,
    /// Risk weights and thresholds.
    pub risk: RiskWeights,
}

/// Monitoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between samples.
    pub interval_secs: u64,
    /// Samples per session.
    pub samples: usize,
    /// Alert thresholds.
    pub thresholds: AlertThresholds,
    /// History file.
    pub history_path: PathBuf,
    /// Sessions kept in the history file.
    pub max_history: usize,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output scoring below this is flagged before printing.
    pub safety_threshold: f64,
    /// Extra abstraction rules, applied after the built-in ones.
    pub custom_patterns: Vec<CustomPattern>,
}

/// A user-defined abstraction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Rule name, used in diagnostics.
    pub name: String,
    /// Regular expression to match.
    pub pattern: String,
    /// Replacement placeholder, e.g. `<customer_id>`.
    pub placeholder: String,
    /// Safety-score penalty per match.
    #[serde(default = "default_custom_weight")]
    pub weight: f64,
}

fn default_custom_weight() -> f64 {
    0.1
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            timeout: 30,
        }
    }
}

/// Default critical path substrings.
pub const DEFAULT_CRITICAL_PATHS: &[&str] = &[
    "migrations/",
    "src/core/safety/",
    "src/core/validation/",
    "config/production/",
    "pyproject.toml",
    "requirements.txt",
];

/// Project manifests smoke-checked when no smoke paths are configured.
pub const DEFAULT_SMOKE_PATHS: &[&str] = &["Cargo.toml", "package.json", "pyproject.toml", "go.mod"];

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            logs_dir: data_dir().join("logs"),
            critical_paths: DEFAULT_CRITICAL_PATHS.iter().map(|s| s.to_string()).collect(),
            max_target_age_days: 30,
            smoke_paths: Vec::new(),
            scan_safety_threshold: 0.5,
            risk: RiskWeights::default(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            samples: 10,
            thresholds: AlertThresholds::default(),
            history_path: data_dir().join("monitoring_history.json"),
            max_history: 100,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            safety_threshold: 0.7,
            custom_patterns: Vec::new(),
        }
    }
}

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cognitive_partner")
}

/// Get the data directory path.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cognitive_partner")
}

/// Path of the default configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load configuration from the default file with env overrides applied.
///
/// Runs before logging is set up, so an invalid file is returned as an error
/// for the caller to report. See [`env_config`] for the fallback.
pub fn load_config() -> Result<Config> {
    load_config_at(&config_path())
}

/// Load `path` if it exists, otherwise defaults, then apply env overrides.
pub fn load_config_at(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        load_config_from(path)?
    } else {
        Config::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Defaults with env overrides applied.
pub fn env_config() -> Config {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load configuration from a specific file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Apply `PARTNER_API_*` overrides using the given lookup.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("PARTNER_API_URL") {
        config.api.base_url = url;
    }
    if let Some(token) = lookup("PARTNER_API_TOKEN") {
        config.api.token = Some(token);
    }
    if let Some(timeout) = lookup("PARTNER_API_TIMEOUT").and_then(|s| s.parse().ok()) {
        config.api.timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api.timeout, 30);
        assert_eq!(config.rollback.max_target_age_days, 30);
        assert_eq!(config.rollback.critical_paths.len(), 6);
        assert_eq!(config.monitor.max_history, 100);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = load_config_at(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.rollback.max_target_age_days, 30);
        assert!(config.rollback.smoke_paths.is_empty());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[rollback\nmax_target_age_days = ").unwrap();

        let err = load_config_at(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Toml(_)), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://partner.example.com"

[rollback.risk]
critical_threshold = 10

[[output.custom_patterns]]
name = "ticket"
pattern = "TICKET-[0-9]+"
placeholder = "<ticket>"
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.api.base_url, "https://partner.example.com");
        assert_eq!(config.api.timeout, 30);
        assert_eq!(config.rollback.risk.critical_threshold, 10);
        assert_eq!(config.rollback.risk.high_threshold, 5);
        assert_eq!(config.output.custom_patterns.len(), 1);
        assert_eq!(config.output.custom_patterns[0].weight, 0.1);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PARTNER_API_URL", "http://backend:9000"),
            ("PARTNER_API_TOKEN", "tok"),
            ("PARTNER_API_TIMEOUT", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://backend:9000");
        assert_eq!(config.api.token.as_deref(), Some("tok"));
        assert_eq!(config.api.timeout, 30);
    }
}
