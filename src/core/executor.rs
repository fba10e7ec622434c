//! Rollback executor module.
//!
//! Executes a rollback plan in strictly ordered phases:
//! 1. Safety gate
//! 2. Backup branch at the current HEAD
//! 3. Stash uncommitted work
//! 4. Hard reset to the target (stash restored if this fails)
//! 5. Post-rollback validation
//! 6. Markdown report
//!
//! Operational failures are recorded in the [`ExecutionResult`]; only the
//! safety gate returns an error.
//!
//! A cancel flag is checked before phases 2, 3 and 4. Once the reset has
//! started the run is no longer cancellable.

use crate::core::abstraction::AbstractionEngine;
use crate::generators::report;
use crate::models::config::{RollbackConfig, DEFAULT_SMOKE_PATHS};
use crate::models::rollback::{
    ExecuteOptions, ExecutionOutcome, ExecutionResult, RollbackPlan, SimulatedExecution,
};
use crate::services::git::Vcs;
use crate::Result;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Checks run by post-rollback validation: clean tree, critical files,
/// smoke paths and the sensitive-content scan. The smoke check is skipped
/// when there are no smoke paths.
pub const VALIDATION_CHECK_COUNT: usize = 4;

/// Changed files larger than this are not scanned.
const MAX_SCAN_BYTES: u64 = 1024 * 1024;

/// Rollback executor.
pub struct RollbackExecutor<'a> {
    vcs: &'a dyn Vcs,
    config: RollbackConfig,
    engine: AbstractionEngine,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> RollbackExecutor<'a> {
    /// Create an executor with default configuration.
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self::with_config(vcs, RollbackConfig::default())
    }

    /// Create an executor with custom configuration.
    pub fn with_config(vcs: &'a dyn Vcs, config: RollbackConfig) -> Self {
        Self {
            vcs,
            config,
            engine: AbstractionEngine::default(),
            cancel: None,
        }
    }

    /// Use a specific engine for the sensitive-content scan.
    pub fn with_engine(mut self, engine: AbstractionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Stop before the next mutating phase once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Record a cancellation before `phase`. Returns whether the run stops.
    fn stop_if_cancelled(&self, phase: &str, result: &mut ExecutionResult) -> bool {
        if !self.cancel_requested() {
            return false;
        }
        tracing::warn!("Rollback {} cancelled before {}", result.session_id, phase);
        result.cancelled = true;
        result
            .errors
            .push(format!("Rollback cancelled before {}", phase));
        true
    }

    /// Execute a plan. The plan is consumed, so it runs at most once.
    ///
    /// Returns [`crate::Error::RollbackBlocked`] when the plan is unsafe and
    /// `force` is not set; nothing has been touched in that case.
    pub fn execute(&self, plan: RollbackPlan, options: ExecuteOptions) -> Result<ExecutionOutcome> {
        let session_id = new_session_id();

        if options.dry_run {
            return Ok(ExecutionOutcome::Simulated(self.simulate(&plan, options, session_id)));
        }

        if !plan.is_safe_to_execute() && !options.force {
            tracing::warn!("Rollback blocked: risk level {}", plan.risk_level);
            return Err(crate::Error::RollbackBlocked {
                risk_level: plan.risk_level,
                reasons: plan.unsafe_reasons(),
            });
        }

        tracing::info!(
            "Executing rollback {} to {} ({})",
            session_id,
            plan.target.target_ref,
            plan.target.short_hash()
        );

        let started = Instant::now();
        let mut result = ExecutionResult {
            session_id,
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        self.run_phases(&plan, options, &mut result);

        result.success = result.rollback_completed && result.errors.is_empty();
        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match report::write_rollback_report(&plan, &result, &self.config.logs_dir) {
            Ok(path) => result.report_path = Some(path),
            Err(e) => tracing::warn!("Failed to write rollback report: {}", e),
        }

        tracing::info!(
            "Rollback {} finished: success={} ({} ms)",
            result.session_id,
            result.success,
            result.duration_ms
        );
        Ok(ExecutionOutcome::Executed(result))
    }

    /// Phases 2-5. Returns early when a phase aborts the run.
    fn run_phases(&self, plan: &RollbackPlan, options: ExecuteOptions, result: &mut ExecutionResult) {
        let Some(target_commit) = plan.target.commit_hash.as_deref() else {
            result
                .errors
                .push("Plan target has no resolved commit".to_string());
            return;
        };

        if self.stop_if_cancelled("backup", result) {
            return;
        }

        // Phase 2: backup branch
        if let Some(ref name) = plan.backup_branch_name {
            match self.vcs.create_branch(name, &plan.current_commit) {
                Ok(()) => result.backup_created = true,
                Err(e) if options.force => result
                    .warnings
                    .push(format!("Backup branch {} not created: {}", name, e)),
                Err(e) => {
                    result
                        .errors
                        .push(format!("Failed to create backup branch {}: {}", name, e));
                    return;
                }
            }
        }

        if self.stop_if_cancelled("stash", result) {
            return;
        }

        // Phase 3: stash
        let mut stash = None;
        if plan.has_uncommitted_changes {
            let message = format!("rollback-stash-{}", Utc::now().timestamp());
            match self.vcs.stash_push(&message) {
                Ok(Some(commit)) => {
                    result.stash_created = true;
                    stash = Some(commit);
                }
                Ok(None) => result
                    .warnings
                    .push("No uncommitted changes were left to stash".to_string()),
                Err(e) => {
                    result
                        .errors
                        .push(format!("Failed to stash uncommitted changes: {}", e));
                    return;
                }
            }
        }

        if self.stop_if_cancelled("reset", result) {
            if let Some(ref commit) = stash {
                self.restore_stash(commit, "cancellation", result);
            }
            return;
        }

        // Phase 4: reset
        if let Err(e) = self.vcs.reset_hard(target_commit) {
            result
                .errors
                .push(format!("Reset to {} failed: {}", plan.target.short_hash(), e));
            if let Some(ref commit) = stash {
                self.restore_stash(commit, "failed reset", result);
            }
            return;
        }
        result.rollback_completed = true;

        if let Some(ref commit) = stash {
            result.warnings.push(format!(
                "Uncommitted changes are saved in stash {}",
                commit.chars().take(8).collect::<String>()
            ));
        }

        // Phase 5: validation
        if options.run_validation {
            let smoke_paths = self.smoke_paths(target_commit);
            let issues = self.validate(plan, target_commit, &smoke_paths);
            result.validation_passed = issues.is_empty();
            result.warnings.extend(issues);
        }
    }

    /// Re-apply a stash created by this run. The outcome is a warning either way.
    fn restore_stash(&self, commit: &str, after: &str, result: &mut ExecutionResult) {
        match self.vcs.stash_apply(commit) {
            Ok(()) => result
                .warnings
                .push(format!("Stashed changes restored after {}", after)),
            Err(e) => result.warnings.push(format!(
                "Could not restore stashed changes from {}: {}",
                commit, e
            )),
        }
    }

    /// Configured smoke paths, or the default manifests tracked at the target.
    fn smoke_paths(&self, target_commit: &str) -> Vec<PathBuf> {
        if !self.config.smoke_paths.is_empty() {
            return self.config.smoke_paths.clone();
        }
        DEFAULT_SMOKE_PATHS
            .iter()
            .filter(|path| matches!(self.vcs.path_exists_at(target_commit, path), Ok(true)))
            .map(PathBuf::from)
            .collect()
    }

    /// Post-rollback checks. Every finding is a warning.
    fn validate(
        &self,
        plan: &RollbackPlan,
        target_commit: &str,
        smoke_paths: &[PathBuf],
    ) -> Vec<String> {
        let mut issues = Vec::new();
        let workdir = self.vcs.workdir();

        match self.vcs.has_uncommitted_changes() {
            Ok(false) => {}
            Ok(true) => issues.push("Working tree is not clean after rollback".to_string()),
            Err(e) => issues.push(format!("Could not check working tree: {}", e)),
        }

        for path in &plan.critical_files {
            match self.vcs.path_exists_at(target_commit, path) {
                Ok(true) if !workdir.join(path).exists() => {
                    issues.push(format!("Critical file missing after rollback: {}", path))
                }
                Ok(_) => {}
                Err(e) => issues.push(format!("Could not check critical file {}: {}", path, e)),
            }
        }

        if smoke_paths.is_empty() {
            tracing::debug!("No smoke paths at target; smoke check skipped");
        }
        for path in smoke_paths {
            let full_path = workdir.join(path);
            match fs::read(&full_path) {
                Ok(bytes) if bytes.is_empty() => {
                    issues.push(format!("Smoke check failed: {} is empty", path.display()))
                }
                Ok(_) => {}
                Err(e) => issues.push(format!(
                    "Smoke check failed: {} is not readable: {}",
                    path.display(),
                    e
                )),
            }
        }

        for path in &plan.files_to_change {
            let full_path = workdir.join(path);
            let small_enough = fs::metadata(&full_path)
                .map(|m| m.is_file() && m.len() <= MAX_SCAN_BYTES)
                .unwrap_or(false);
            if !small_enough {
                continue;
            }
            // Binary files fail UTF-8 decoding and are skipped
            let Ok(content) = fs::read_to_string(&full_path) else {
                continue;
            };
            let scan = self.engine.process(&content);
            if !scan.is_safe(self.config.scan_safety_threshold) {
                issues.push(format!(
                    "{} contains sensitive content (safety score {:.2})",
                    path, scan.safety_score
                ));
            }
        }

        tracing::debug!("Validation found {} issue(s)", issues.len());
        issues
    }

    /// Describe what a real run would do without touching the repository.
    fn simulate(
        &self,
        plan: &RollbackPlan,
        options: ExecuteOptions,
        session_id: String,
    ) -> SimulatedExecution {
        let mut planned_actions = Vec::new();

        if let Some(ref name) = plan.backup_branch_name {
            planned_actions.push(format!(
                "Create backup branch {} at {}",
                name,
                plan.current_commit.chars().take(8).collect::<String>()
            ));
        }
        if plan.has_uncommitted_changes {
            planned_actions.push("Stash uncommitted changes".to_string());
        }
        planned_actions.push(format!(
            "Reset to {} ({}), removing {} commit(s) and changing {} file(s)",
            plan.target.short_hash(),
            plan.target.target_ref,
            plan.commits_to_lose.len(),
            plan.files_to_change.len()
        ));
        let validation_checks = if options.run_validation {
            let smoke_paths = plan
                .target
                .commit_hash
                .as_deref()
                .map(|commit| self.smoke_paths(commit))
                .unwrap_or_default();
            let (count, smoke) = if smoke_paths.is_empty() {
                (VALIDATION_CHECK_COUNT - 1, "no smoke paths".to_string())
            } else {
                let names: Vec<String> =
                    smoke_paths.iter().map(|p| p.display().to_string()).collect();
                (VALIDATION_CHECK_COUNT, format!("smoke: {}", names.join(", ")))
            };
            planned_actions.push(format!("Run {} validation checks ({})", count, smoke));
            count
        } else {
            0
        };
        planned_actions.push(format!(
            "Write report to {}",
            self.config
                .logs_dir
                .join(format!("rollback_{}.md", session_id))
                .display()
        ));

        for action in &planned_actions {
            tracing::info!("[DRY RUN] {}", action);
        }

        SimulatedExecution {
            session_id,
            planned_actions,
            backup_branch: plan.backup_branch_name.clone(),
            would_stash: plan.has_uncommitted_changes,
            commits_removed: plan.commits_to_lose.len(),
            files_changed: plan.files_to_change.len(),
            validation_checks,
            would_be_blocked: !plan.is_safe_to_execute() && !options.force,
        }
    }
}

/// Session id: `YYYYmmdd_HHMMSS_<8 hex chars>`.
pub fn new_session_id() -> String {
    format!(
        "{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        &Uuid::new_v4().to_string()[..8]
    )
}
