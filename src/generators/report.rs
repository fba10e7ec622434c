//! Rollback report generator (Markdown).

use crate::models::rollback::{ExecutionResult, RollbackPlan};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Generate the Markdown report for an executed rollback.
pub fn generate_rollback_report(plan: &RollbackPlan, result: &ExecutionResult) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Rollback Report {}\n\n", result.session_id));

    // Session
    md.push_str("## Session\n\n");
    if let Some(started_at) = result.started_at {
        md.push_str(&format!("- **Started:** {}\n", started_at.to_rfc3339()));
    }
    md.push_str(&format!("- **Duration:** {} ms\n", result.duration_ms));
    md.push_str(&format!(
        "- **Operator:** {}@{}\n",
        whoami::username(),
        whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string())
    ));
    let status = if result.success {
        "SUCCESS"
    } else if result.cancelled {
        "CANCELLED"
    } else {
        "FAILED"
    };
    md.push_str(&format!("- **Status:** {}\n\n", status));

    // Target
    md.push_str("## Target\n\n");
    md.push_str(&format!(
        "- **Reference:** `{}` ({})\n",
        plan.target.target_ref, plan.target.target_type
    ));
    md.push_str(&format!("- **Commit:** `{}`\n", plan.target.short_hash()));
    if let Some(ref message) = plan.target.commit_message {
        md.push_str(&format!("- **Message:** {}\n", message));
    }
    md.push_str(&format!(
        "- **Previous HEAD:** `{}`",
        plan.current_commit.chars().take(8).collect::<String>()
    ));
    match plan.current_branch {
        Some(ref branch) => md.push_str(&format!(" on `{}`\n\n", branch)),
        None => md.push_str(" (detached)\n\n"),
    }

    // Plan
    md.push_str("## Plan\n\n");
    md.push_str(&format!(
        "- **Risk:** {} (score {})\n",
        plan.risk_level, plan.risk_score
    ));
    md.push_str(&format!("- **Commits removed:** {}\n", plan.commits_to_lose.len()));
    md.push_str(&format!("- **Files changed:** {}\n", plan.files_to_change.len()));
    if let Some(ref backup) = plan.backup_branch_name {
        md.push_str(&format!("- **Backup branch:** `{}`\n", backup));
    }
    if !plan.risk_factors.is_empty() {
        md.push_str("\n**Risk factors:**\n\n");
        for factor in &plan.risk_factors {
            md.push_str(&format!("- {}\n", factor));
        }
    }
    md.push('\n');

    // Phases
    md.push_str("## Phases\n\n");
    md.push_str("| Phase | Result |\n|---|---|\n");
    md.push_str(&format!("| Backup branch | {} |\n", yes_no(result.backup_created)));
    md.push_str(&format!("| Stash | {} |\n", yes_no(result.stash_created)));
    md.push_str(&format!("| Reset | {} |\n", yes_no(result.rollback_completed)));
    md.push_str(&format!("| Validation | {} |\n\n", yes_no(result.validation_passed)));

    if !result.errors.is_empty() {
        md.push_str(&format!("## Errors ({})\n\n", result.errors.len()));
        for error in &result.errors {
            md.push_str(&format!("- {}\n", error));
        }
        md.push('\n');
    }

    if !result.warnings.is_empty() {
        md.push_str(&format!("## Warnings ({})\n\n", result.warnings.len()));
        for warning in &result.warnings {
            md.push_str(&format!("- {}\n", warning));
        }
        md.push('\n');
    }

    md
}

/// Write the report to `<dir>/rollback_<session_id>.md`.
pub fn write_rollback_report(
    plan: &RollbackPlan,
    result: &ExecutionResult,
    dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("rollback_{}.md", result.session_id));
    fs::write(&path, generate_rollback_report(plan, result))?;
    tracing::info!("Rollback report saved to {:?}", path);
    Ok(path)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
