//! Preflight checks module.

mod api;
mod git;

use crate::models::config::ApiConfig;
use colored::Colorize;

/// Result of a preflight check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    pub fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn fail(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

/// A dependency a command needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The `git` binary.
    Git,
    /// The backend API.
    Api,
}

/// Run the checks for the given requirements.
pub async fn run_preflight_checks(
    requirements: &[Requirement],
    api_config: &ApiConfig,
) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for requirement in requirements {
        match requirement {
            Requirement::Git => results.push(git::check()),
            Requirement::Api => results.push(api::check(api_config).await),
        }
    }

    results
}

/// Print preflight check results.
pub fn print_results(results: &[CheckResult]) {
    for result in results {
        if result.success {
            println!(
                "{} {}: {}",
                "[OK]".green(),
                result.name.bold(),
                result.message
            );
        } else {
            println!(
                "{} {}: {}",
                "[FAIL]".red(),
                result.name.bold(),
                result.message
            );
            if let Some(ref hint) = result.hint {
                println!("  {} {}", "->".yellow(), hint);
            }
        }
    }
}

/// Check if all preflight checks passed.
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_passed() {
        let results = vec![
            CheckResult::ok("git", "installed"),
            CheckResult::fail("Backend API", "not reachable", "start it"),
        ];
        assert!(!all_passed(&results));
        assert!(all_passed(&results[..1]));
        assert!(all_passed(&[]));
    }

    #[tokio::test]
    async fn test_unreachable_api_fails() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            token: None,
            timeout: 2,
        };
        let results = run_preflight_checks(&[Requirement::Api], &config).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0].hint.is_some());
    }
}
