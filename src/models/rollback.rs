//! Rollback data model.
//!
//! A rollback moves from a user-supplied reference to a validated
//! [`RollbackTarget`], then to a [`RollbackPlan`] with a computed risk level,
//! and finally to an [`ExecutionOutcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Kind of reference a rollback target was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Commit,
    Branch,
    Tag,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Commit => write!(f, "commit"),
            TargetType::Branch => write!(f, "branch"),
            TargetType::Tag => write!(f, "tag"),
        }
    }
}

/// A resolved rollback destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackTarget {
    /// Reference as typed by the user.
    pub target_ref: String,
    /// How the reference was classified.
    pub target_type: TargetType,
    /// Full commit hash, if the reference resolved.
    pub commit_hash: Option<String>,
    /// Commit subject line.
    pub commit_message: Option<String>,
    /// Commit date.
    pub commit_date: Option<DateTime<Utc>>,
    /// Whether the target passed validation.
    pub is_valid: bool,
    /// Fatal validation errors.
    pub validation_errors: Vec<String>,
    /// Non-fatal findings (e.g. an old target).
    pub warnings: Vec<String>,
}

impl RollbackTarget {
    /// Create an unresolved target for a reference.
    pub fn unresolved(target_ref: &str) -> Self {
        Self {
            target_ref: target_ref.to_string(),
            target_type: TargetType::Commit,
            commit_hash: None,
            commit_message: None,
            commit_date: None,
            is_valid: false,
            validation_errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Abbreviated commit hash for display.
    pub fn short_hash(&self) -> &str {
        match self.commit_hash.as_deref() {
            Some(hash) if hash.len() > 8 => &hash[..8],
            Some(hash) => hash,
            None => "unknown",
        }
    }
}

/// Coarse classification of how dangerous a plan is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a score against the thresholds.
    pub fn from_score(score: u32, weights: &RiskWeights) -> Self {
        if score >= weights.critical_threshold {
            RiskLevel::Critical
        } else if score >= weights.high_threshold {
            RiskLevel::High
        } else if score >= weights.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Weights and thresholds for risk scoring.
///
/// The defaults reproduce the long-standing behavior; they have no derivation
/// beyond that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub uncommitted_changes: u32,
    pub critical_files: u32,
    /// Added when more than `many_commits` commits would be lost.
    pub many_commits_lost: u32,
    /// Added when at least one commit would be lost.
    pub some_commits_lost: u32,
    pub many_commits: usize,
    /// Added when more than `many_files` files change.
    pub many_files_changed: u32,
    /// Added when more than `some_files` files change.
    pub some_files_changed: u32,
    pub many_files: usize,
    pub some_files: usize,
    pub critical_threshold: u32,
    pub high_threshold: u32,
    pub medium_threshold: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            uncommitted_changes: 2,
            critical_files: 3,
            many_commits_lost: 2,
            some_commits_lost: 1,
            many_commits: 5,
            many_files_changed: 2,
            some_files_changed: 1,
            many_files: 20,
            some_files: 5,
            critical_threshold: 8,
            high_threshold: 5,
            medium_threshold: 2,
        }
    }
}

/// The plan fields the risk score depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskInputs {
    pub uncommitted_changes: bool,
    pub critical_files_affected: bool,
    pub commits_lost: usize,
    pub files_changed: usize,
    pub risk_factor_count: usize,
}

/// Compute the additive risk score.
pub fn risk_score(inputs: &RiskInputs, weights: &RiskWeights) -> u32 {
    let mut score = 0;

    if inputs.uncommitted_changes {
        score += weights.uncommitted_changes;
    }
    if inputs.critical_files_affected {
        score += weights.critical_files;
    }

    if inputs.commits_lost > weights.many_commits {
        score += weights.many_commits_lost;
    } else if inputs.commits_lost > 0 {
        score += weights.some_commits_lost;
    }

    if inputs.files_changed > weights.many_files {
        score += weights.many_files_changed;
    } else if inputs.files_changed > weights.some_files {
        score += weights.some_files_changed;
    }

    score.saturating_add(u32::try_from(inputs.risk_factor_count).unwrap_or(u32::MAX))
}

/// A rollback plan derived from a validated target and the repository state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackPlan {
    /// The validated target.
    pub target: RollbackTarget,
    /// HEAD at planning time.
    pub current_commit: String,
    /// Checked-out branch, `None` when HEAD is detached.
    pub current_branch: Option<String>,
    /// Paths that differ between target and HEAD.
    pub files_to_change: BTreeSet<String>,
    /// Abbreviated hashes in `target..HEAD`, newest first.
    pub commits_to_lose: Vec<String>,
    pub has_uncommitted_changes: bool,
    pub affects_critical_files: bool,
    /// Changed paths that matched a critical pattern.
    pub critical_files: Vec<String>,
    pub potential_data_loss: bool,
    /// Reserved backup branch name; created by the executor.
    pub backup_branch_name: Option<String>,
    pub risk_level: RiskLevel,
    pub risk_score: u32,
    /// Human-readable reasons, in the order they were found.
    pub risk_factors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl RollbackPlan {
    /// The inputs the risk level was computed from.
    pub fn risk_inputs(&self) -> RiskInputs {
        RiskInputs {
            uncommitted_changes: self.has_uncommitted_changes,
            critical_files_affected: self.affects_critical_files,
            commits_lost: self.commits_to_lose.len(),
            files_changed: self.files_to_change.len(),
            risk_factor_count: self.risk_factors.len(),
        }
    }

    /// Whether the executor may run this plan without `--force`.
    pub fn is_safe_to_execute(&self) -> bool {
        if self.risk_level == RiskLevel::Critical {
            return false;
        }
        let has_backup = self.backup_branch_name.is_some();
        if self.has_uncommitted_changes && !has_backup {
            return false;
        }
        if self.potential_data_loss && !has_backup {
            return false;
        }
        true
    }

    /// Reasons the plan is considered unsafe, for the blocked-rollback message.
    pub fn unsafe_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        let has_backup = self.backup_branch_name.is_some();

        if self.risk_level == RiskLevel::Critical {
            reasons.push("risk level is CRITICAL".to_string());
        }
        if self.has_uncommitted_changes && !has_backup {
            reasons.push("uncommitted changes without a backup branch".to_string());
        }
        if self.potential_data_loss && !has_backup {
            reasons.push(format!(
                "{} commit(s) would be lost without a backup branch",
                self.commits_to_lose.len()
            ));
        }
        reasons
    }
}

/// Options controlling plan execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Run even if the plan is unsafe or the backup fails.
    pub force: bool,
    /// Run post-rollback validation.
    pub run_validation: bool,
    /// Simulate only.
    pub dry_run: bool,
}

/// Result of a real execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub session_id: String,
    pub success: bool,
    pub backup_created: bool,
    pub stash_created: bool,
    pub rollback_completed: bool,
    pub validation_passed: bool,
    /// Stopped by the cancel flag before the reset.
    #[serde(default)]
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
    pub report_path: Option<PathBuf>,
}

/// Result of a dry run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedExecution {
    pub session_id: String,
    /// Actions that would be taken, in order.
    pub planned_actions: Vec<String>,
    pub backup_branch: Option<String>,
    pub would_stash: bool,
    pub commits_removed: usize,
    pub files_changed: usize,
    /// Number of validation checks that would run.
    pub validation_checks: usize,
    /// Whether the safety gate would have blocked a real run.
    pub would_be_blocked: bool,
}

/// Outcome of [`crate::core::executor::RollbackExecutor::execute`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Executed(ExecutionResult),
    Simulated(SimulatedExecution),
}

impl ExecutionOutcome {
    /// Whether the rollback (or its simulation) succeeded.
    pub fn is_success(&self) -> bool {
        match self {
            ExecutionOutcome::Executed(result) => result.success,
            ExecutionOutcome::Simulated(_) => true,
        }
    }
}

/// A candidate shown by `rollback --list-targets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCandidate {
    pub reference: String,
    pub target_type: TargetType,
    pub commit_hash: String,
    pub summary: String,
    pub date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(level: RiskLevel, uncommitted: bool, data_loss: bool, backup: bool) -> RollbackPlan {
        RollbackPlan {
            target: RollbackTarget::unresolved("abc"),
            current_commit: "head".to_string(),
            current_branch: Some("main".to_string()),
            files_to_change: BTreeSet::new(),
            commits_to_lose: Vec::new(),
            has_uncommitted_changes: uncommitted,
            affects_critical_files: false,
            critical_files: Vec::new(),
            potential_data_loss: data_loss,
            backup_branch_name: backup.then(|| "backup-before-rollback-1".to_string()),
            risk_level: level,
            risk_score: 0,
            risk_factors: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_risk_level_thresholds() {
        let weights = RiskWeights::default();
        assert_eq!(RiskLevel::from_score(0, &weights), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(1, &weights), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(2, &weights), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(4, &weights), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5, &weights), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(7, &weights), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(8, &weights), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_score_components() {
        let weights = RiskWeights::default();
        let inputs = RiskInputs {
            uncommitted_changes: true,
            critical_files_affected: true,
            commits_lost: 15,
            files_changed: 3,
            risk_factor_count: 0,
        };
        assert_eq!(risk_score(&inputs, &weights), 7);

        let inputs = RiskInputs {
            uncommitted_changes: false,
            critical_files_affected: false,
            commits_lost: 3,
            files_changed: 6,
            risk_factor_count: 1,
        };
        assert_eq!(risk_score(&inputs, &weights), 3);

        let inputs = RiskInputs {
            uncommitted_changes: false,
            critical_files_affected: false,
            commits_lost: 0,
            files_changed: 21,
            risk_factor_count: 0,
        };
        assert_eq!(risk_score(&inputs, &weights), 2);
    }

    #[test]
    fn test_risk_score_is_pure() {
        let weights = RiskWeights::default();
        for uncommitted in [false, true] {
            for critical in [false, true] {
                for commits in [0, 1, 6, 12] {
                    for files in [0, 6, 25] {
                        for factors in 0..4 {
                            let inputs = RiskInputs {
                                uncommitted_changes: uncommitted,
                                critical_files_affected: critical,
                                commits_lost: commits,
                                files_changed: files,
                                risk_factor_count: factors,
                            };
                            let a = RiskLevel::from_score(risk_score(&inputs, &weights), &weights);
                            let b = RiskLevel::from_score(risk_score(&inputs, &weights), &weights);
                            assert_eq!(a, b);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_critical_plan_never_safe() {
        for uncommitted in [false, true] {
            for data_loss in [false, true] {
                for backup in [false, true] {
                    let plan = plan_with(RiskLevel::Critical, uncommitted, data_loss, backup);
                    assert!(!plan.is_safe_to_execute());
                }
            }
        }
    }

    #[test]
    fn test_safe_to_execute_requires_backup() {
        assert!(plan_with(RiskLevel::Low, false, false, false).is_safe_to_execute());
        assert!(!plan_with(RiskLevel::Low, true, false, false).is_safe_to_execute());
        assert!(!plan_with(RiskLevel::Medium, false, true, false).is_safe_to_execute());
        assert!(plan_with(RiskLevel::High, true, true, true).is_safe_to_execute());
    }

    #[test]
    fn test_unsafe_reasons_match_gate() {
        let plan = plan_with(RiskLevel::Critical, true, false, false);
        let reasons = plan.unsafe_reasons();
        assert_eq!(reasons.len(), 2);
        assert!(plan_with(RiskLevel::Low, false, false, false)
            .unsafe_reasons()
            .is_empty());
    }

    #[test]
    fn test_short_hash() {
        let mut target = RollbackTarget::unresolved("main");
        assert_eq!(target.short_hash(), "unknown");
        target.commit_hash = Some("0123456789abcdef".to_string());
        assert_eq!(target.short_hash(), "01234567");
    }
}
