//! Rollback planning module.
//!
//! Turns a user-supplied reference into a rollback plan:
//! 1. Resolve and classify the reference (branch, tag or commit)
//! 2. Validate it against HEAD (not HEAD itself, must be an ancestor)
//! 3. Inspect the repository (dirty tree, lost commits, changed files)
//! 4. Collect risk factors and compute the risk level
//!
//! A plan can only be built from a validated target.

use crate::models::config::RollbackConfig;
use crate::models::rollback::{
    risk_score, RiskLevel, RollbackPlan, RollbackTarget, TargetCandidate, TargetType,
};
use crate::services::git::Vcs;
use crate::Result;
use chrono::Utc;
use std::collections::BTreeSet;

/// Commits lost beyond this count add a risk factor.
const MANY_COMMITS_FACTOR: usize = 10;

/// Rollback planner.
pub struct RollbackPlanner<'a> {
    vcs: &'a dyn Vcs,
    config: RollbackConfig,
}

impl<'a> RollbackPlanner<'a> {
    /// Create a planner with default configuration.
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self::with_config(vcs, RollbackConfig::default())
    }

    /// Create a planner with custom configuration.
    pub fn with_config(vcs: &'a dyn Vcs, config: RollbackConfig) -> Self {
        Self { vcs, config }
    }

    /// Resolve, classify and validate a reference.
    ///
    /// Validation failures are reported through `validation_errors`;
    /// only repository access failures are returned as errors.
    pub fn analyze_target(&self, reference: &str) -> Result<RollbackTarget> {
        let mut target = RollbackTarget::unresolved(reference);

        let reference = reference.trim();
        if reference.is_empty() {
            target.validation_errors.push("No target reference given".to_string());
            return Ok(target);
        }

        let Some(commit_hash) = self.vcs.resolve_commit(reference)? else {
            target
                .validation_errors
                .push(format!("Could not resolve '{}' to a commit", reference));
            return Ok(target);
        };

        target.target_type = if self.vcs.branch_exists(reference)? {
            TargetType::Branch
        } else if self.vcs.tag_exists(reference)? {
            TargetType::Tag
        } else {
            TargetType::Commit
        };

        let info = self.vcs.commit_info(&commit_hash)?;
        target.commit_message = Some(info.message);
        target.commit_date = Some(info.date);
        target.commit_hash = Some(commit_hash.clone());

        let head = self.vcs.head_commit()?;
        if commit_hash == head {
            target
                .validation_errors
                .push("Target is the current commit; nothing to roll back".to_string());
        } else if !self.vcs.is_ancestor(&commit_hash, &head)? {
            target
                .validation_errors
                .push("Target commit is not an ancestor of the current HEAD".to_string());
        }

        let age_days = (Utc::now() - info.date).num_days();
        if age_days > self.config.max_target_age_days {
            target.warnings.push(format!(
                "Target commit is {} days old (older than {} days)",
                age_days, self.config.max_target_age_days
            ));
        }

        target.is_valid = target.validation_errors.is_empty();
        tracing::debug!(
            "Analyzed target {} ({}): valid={}",
            reference,
            target.target_type,
            target.is_valid
        );
        Ok(target)
    }

    /// Build a plan for a validated target.
    pub fn create_plan(&self, target: &RollbackTarget, create_backup: bool) -> Result<RollbackPlan> {
        let target_commit = match (&target.commit_hash, target.is_valid) {
            (Some(hash), true) => hash.clone(),
            _ => {
                return Err(crate::Error::InvalidRollbackTarget {
                    target: target.target_ref.clone(),
                    errors: target.validation_errors.clone(),
                })
            }
        };

        let current_commit = self.vcs.head_commit()?;
        let current_branch = self.vcs.current_branch()?;
        let mut risk_factors = Vec::new();

        let has_uncommitted_changes = self.vcs.has_uncommitted_changes()?;
        if has_uncommitted_changes {
            risk_factors.push("Uncommitted changes in the working tree".to_string());
        }

        let commits_to_lose = self.vcs.commits_between(&target_commit, "HEAD")?;
        if commits_to_lose.len() > MANY_COMMITS_FACTOR {
            risk_factors.push(format!(
                "Rolling back {} commits (more than {})",
                commits_to_lose.len(),
                MANY_COMMITS_FACTOR
            ));
        }

        let files_to_change: BTreeSet<String> = self
            .vcs
            .changed_files(&target_commit, "HEAD")?
            .into_iter()
            .collect();

        let critical_files: Vec<String> = files_to_change
            .iter()
            .filter(|path| self.is_critical(path))
            .cloned()
            .collect();
        for path in &critical_files {
            risk_factors.push(format!("Critical file affected: {}", path));
        }

        let potential_data_loss = !commits_to_lose.is_empty();
        if potential_data_loss {
            risk_factors.push(format!(
                "{} commit(s) will be removed from branch history",
                commits_to_lose.len()
            ));
        }

        let backup_branch_name =
            create_backup.then(|| format!("backup-before-rollback-{}", Utc::now().timestamp()));

        let mut plan = RollbackPlan {
            target: target.clone(),
            current_commit,
            current_branch,
            files_to_change,
            commits_to_lose,
            has_uncommitted_changes,
            affects_critical_files: !critical_files.is_empty(),
            critical_files,
            potential_data_loss,
            backup_branch_name,
            risk_level: RiskLevel::Low,
            risk_score: 0,
            risk_factors,
            created_at: Utc::now(),
        };

        plan.risk_score = risk_score(&plan.risk_inputs(), &self.config.risk);
        plan.risk_level = RiskLevel::from_score(plan.risk_score, &self.config.risk);

        tracing::info!(
            "Rollback plan: {} commit(s), {} file(s), risk {} ({})",
            plan.commits_to_lose.len(),
            plan.files_to_change.len(),
            plan.risk_level,
            plan.risk_score
        );
        Ok(plan)
    }

    /// Recent commits, branches and tags that could be rolled back to.
    pub fn list_targets(&self, limit: usize) -> Result<Vec<TargetCandidate>> {
        let mut candidates = Vec::new();

        for name in self.vcs.branches()? {
            if let Some(hash) = self.vcs.resolve_commit(&name)? {
                let info = self.vcs.commit_info(&hash)?;
                candidates.push(TargetCandidate {
                    reference: name,
                    target_type: TargetType::Branch,
                    commit_hash: info.short_hash,
                    summary: info.message,
                    date: Some(info.date),
                });
            }
        }

        for name in self.vcs.tags()? {
            if let Some(hash) = self.vcs.resolve_commit(&name)? {
                let info = self.vcs.commit_info(&hash)?;
                candidates.push(TargetCandidate {
                    reference: name,
                    target_type: TargetType::Tag,
                    commit_hash: info.short_hash,
                    summary: info.message,
                    date: Some(info.date),
                });
            }
        }

        // HEAD itself is not a valid target
        for info in self.vcs.recent_commits(limit + 1)?.into_iter().skip(1) {
            candidates.push(TargetCandidate {
                reference: info.short_hash.clone(),
                target_type: TargetType::Commit,
                commit_hash: info.short_hash,
                summary: info.message,
                date: Some(info.date),
            });
        }

        Ok(candidates)
    }

    fn is_critical(&self, path: &str) -> bool {
        self.config
            .critical_paths
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
    }
}
