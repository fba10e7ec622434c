//! Error types for the cognitive partner client.

use crate::models::rollback::RiskLevel;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the cognitive partner client.
#[derive(Error, Debug)]
pub enum Error {
    // Preflight errors
    #[error("git not found. Install git and make sure it is on PATH")]
    GitNotFound,

    #[error("Backend API not reachable at {0}")]
    ApiUnreachable(String),

    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a git repository: {0}")]
    NotARepository(String),

    // Rollback errors
    #[error("Invalid rollback target '{target}': {}", .errors.join("; "))]
    InvalidRollbackTarget { target: String, errors: Vec<String> },

    #[error("Rollback blocked: risk level {risk_level} requires --force ({})", .reasons.join("; "))]
    RollbackBlocked {
        risk_level: RiskLevel,
        reasons: Vec<String>,
    },

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    // Backend errors
    #[error("API error: {message}")]
    Api {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Not found: {0}")]
    ApiNotFound(String),

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Monitoring errors
    #[error("Metrics collection failed: {0}")]
    Metrics(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a git error for a failed command.
    pub fn git<C: Into<String>, M: Into<String>>(command: C, message: M) -> Self {
        Error::Git {
            command: command.into(),
            message: message.into(),
        }
    }
}
