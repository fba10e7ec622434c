//! Rollback command implementation.
//!
//! Analyzes the target, prints the plan and its risk, then runs the executor
//! on a blocking thread. Ctrl-C raises the executor's cancel flag and the
//! command waits for it to stop before reporting.

use crate::core::abstraction::AbstractionEngine;
use crate::core::executor::RollbackExecutor;
use crate::core::planner::RollbackPlanner;
use crate::models::config::Config;
use crate::models::rollback::{
    ExecuteOptions, ExecutionOutcome, ExecutionResult, RiskLevel, RollbackPlan, SimulatedExecution,
};
use crate::output::{ConsoleSink, OutputSink, SafeOutput};
use crate::services::git::GitCli;
use crate::Result;
use colored::{ColoredString, Colorize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Options for [`rollback`].
#[derive(Debug, Clone)]
pub struct RollbackOptions {
    pub target: Option<String>,
    pub dry_run: bool,
    pub force: bool,
    pub no_backup: bool,
    pub validate: bool,
    pub list_targets: bool,
    pub repo: PathBuf,
}

/// Run `job` on a blocking thread until it returns.
///
/// When `signal` completes first the job's cancel flag is raised and the job
/// is still awaited. Returns the job's value and whether the signal fired.
pub async fn run_cancellable<T, F, S>(job: F, signal: S) -> Result<(T, bool)>
where
    T: Send + 'static,
    F: FnOnce(Arc<AtomicBool>) -> T + Send + 'static,
    S: Future,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let job_cancel = Arc::clone(&cancel);
    let mut task = tokio::task::spawn_blocking(move || job(job_cancel));

    let finished = tokio::select! {
        joined = &mut task => Some(joined),
        _ = signal => None,
    };

    let (joined, signalled) = match finished {
        Some(joined) => (joined, false),
        None => {
            cancel.store(true, Ordering::SeqCst);
            println!();
            println!(
                "{}",
                "[CANCELLING] Waiting for the current phase to finish...".yellow()
            );
            (task.await, true)
        }
    };

    let value = joined.map_err(|e| crate::Error::other(format!("Rollback task failed: {}", e)))?;
    Ok((value, signalled))
}

/// Run the rollback command. Returns whether the command succeeded.
///
/// A run cancelled before the reset counts as success.
pub async fn rollback(options: RollbackOptions, config: &Config) -> Result<bool> {
    println!("{}", "[ROLLBACK] Rollback command".bold().cyan());
    println!();

    let repo = GitCli::discover(&options.repo)?;
    let mut output = SafeOutput::new(
        ConsoleSink,
        AbstractionEngine::from_config(&config.output),
        config.output.safety_threshold,
    );

    if options.list_targets {
        list_targets(&repo, config, &mut output)?;
        return Ok(true);
    }

    let target_ref = options
        .target
        .ok_or_else(|| crate::Error::other("--target is required unless --list-targets is given"))?;

    println!("[INFO] Analyzing target: {}", target_ref);
    let planner = RollbackPlanner::with_config(&repo, config.rollback.clone());
    let target = planner.analyze_target(&target_ref)?;

    for warning in &target.warnings {
        println!("{} {}", "[WARNING]".yellow(), warning);
    }
    if !target.is_valid {
        println!("{}", "[FAILED] Invalid rollback target:".bold().red());
        for error in &target.validation_errors {
            println!("  - {}", error);
        }
        return Err(crate::Error::InvalidRollbackTarget {
            target: target.target_ref,
            errors: target.validation_errors,
        });
    }

    let plan = planner.create_plan(&target, !options.no_backup)?;
    print_plan(&plan, &mut output);

    let execute_options = ExecuteOptions {
        force: options.force,
        run_validation: options.validate,
        dry_run: options.dry_run,
    };

    if !options.dry_run {
        println!(
            "{}",
            "[WARNING] This will hard-reset the working tree!"
                .bold()
                .yellow()
        );
        println!();
    }

    let rollback_config = config.rollback.clone();
    let engine = output.engine().clone();
    let (outcome, signalled) = run_cancellable(
        move |cancel| {
            RollbackExecutor::with_config(&repo, rollback_config)
                .with_engine(engine)
                .with_cancel(cancel)
                .execute(plan, execute_options)
        },
        tokio::signal::ctrl_c(),
    )
    .await?;

    match outcome {
        Ok(ExecutionOutcome::Simulated(simulation)) => {
            print_simulation(&simulation, &target_ref);
            Ok(true)
        }
        Ok(ExecutionOutcome::Executed(result)) if result.cancelled => {
            print_result(&result);
            println!("{}", "[CANCELLED] Rollback cancelled before the reset".yellow());
            if result.backup_created {
                println!("  The backup branch was kept; delete it if it is not needed.");
            }
            Ok(true)
        }
        Ok(ExecutionOutcome::Executed(result)) => {
            print_result(&result);
            if signalled {
                println!(
                    "{}",
                    "[WARNING] Cancel arrived after the reset had started; the rollback was not stopped"
                        .yellow()
                );
            }
            Ok(result.success)
        }
        Err(crate::Error::RollbackBlocked { risk_level, reasons }) => {
            println!(
                "{} Rollback blocked: risk level {}",
                "[BLOCKED]".bold().red(),
                risk_label(risk_level)
            );
            for reason in &reasons {
                println!("  - {}", reason);
            }
            println!();
            println!("  Re-run with {} to proceed anyway.", "--force".bold());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn list_targets<S: OutputSink>(
    repo: &GitCli,
    config: &Config,
    output: &mut SafeOutput<S>,
) -> Result<()> {
    let planner = RollbackPlanner::with_config(repo, config.rollback.clone());
    let candidates = planner.list_targets(10)?;

    if candidates.is_empty() {
        println!("No rollback targets found.");
        return Ok(());
    }

    println!(
        "{:<8} {:<30} {:<10} {:<12} {}",
        "TYPE".bold(),
        "REFERENCE".bold(),
        "COMMIT".bold(),
        "DATE".bold(),
        "SUMMARY".bold()
    );
    for candidate in &candidates {
        let date = candidate
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        output.emit(&format!(
            "{:<8} {:<30} {:<10} {:<12} {}",
            candidate.target_type.to_string(),
            candidate.reference,
            candidate.commit_hash,
            date,
            candidate.summary
        ));
    }
    println!();
    println!("{}", "[Next Steps]".bold().cyan());
    println!("  Preview a rollback:");
    println!("     {}", "cognitive-partner rollback --target <REF> --dry-run".bold());
    Ok(())
}

fn risk_label(level: RiskLevel) -> ColoredString {
    let text = level.to_string();
    match level {
        RiskLevel::Low => text.green(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::High => text.red(),
        RiskLevel::Critical => text.bold().red(),
    }
}

/// Print the plan. Commit messages and risk factors are abstracted.
fn print_plan<S: OutputSink>(plan: &RollbackPlan, output: &mut SafeOutput<S>) {
    output.emit_raw("");
    output.emit_raw(&"[Rollback Plan]".bold().cyan().to_string());
    output.emit(&format!(
        "  {} {} ({}) at {}",
        "Target:".bold(),
        plan.target.target_ref,
        plan.target.target_type,
        plan.target.short_hash()
    ));
    if let Some(ref message) = plan.target.commit_message {
        output.emit(&format!("  {} {}", "Message:".bold(), message));
    }
    output.emit_raw(&format!(
        "  {} {}",
        "Current branch:".bold(),
        plan.current_branch.as_deref().unwrap_or("(detached HEAD)")
    ));
    output.emit_raw(&format!("  {} {}", "Commits removed:".bold(), plan.commits_to_lose.len()));
    output.emit_raw(&format!("  {} {}", "Files changed:".bold(), plan.files_to_change.len()));
    output.emit_raw(&format!(
        "  {} {}",
        "Uncommitted changes:".bold(),
        if plan.has_uncommitted_changes { "yes" } else { "no" }
    ));
    match plan.backup_branch_name {
        Some(ref name) => output.emit_raw(&format!("  {} {}", "Backup branch:".bold(), name)),
        None => output.emit_raw(&format!("  {} {}", "Backup branch:".bold(), "none".yellow())),
    }
    output.emit_raw(&format!(
        "  {} {} (score {})",
        "Risk:".bold(),
        risk_label(plan.risk_level),
        plan.risk_score
    ));
    for factor in &plan.risk_factors {
        output.emit(&format!("    - {}", factor));
    }
    output.emit_raw("");
}

fn print_simulation(simulation: &SimulatedExecution, target_ref: &str) {
    println!("{}", "[DRY-RUN] Showing what would be done:".bold().yellow());
    for (i, action) in simulation.planned_actions.iter().enumerate() {
        println!("  {}. {}", i + 1, action);
    }
    println!();
    if simulation.would_be_blocked {
        println!(
            "{}",
            "[WARNING] A real run would be blocked by the safety gate without --force".yellow()
        );
        println!();
    }
    println!("{}", "[OK] Dry run complete - no changes were made".green());
    println!();
    println!("{}", "[Next Steps]".bold().cyan());
    println!("  To actually execute the rollback:");
    println!(
        "     {}",
        format!("cognitive-partner rollback --target {}", target_ref).bold()
    );
}

fn print_result(result: &ExecutionResult) {
    println!("{}", "[Execution Summary]".bold().green());
    println!("  {} {}", "Session:".bold(), result.session_id);
    println!("  {} {}", "Backup created:".bold(), result.backup_created);
    println!("  {} {}", "Changes stashed:".bold(), result.stash_created);
    println!("  {} {}", "Rollback completed:".bold(), result.rollback_completed);
    println!("  {} {}", "Validation passed:".bold(), result.validation_passed);
    println!("  {} {} ms", "Duration:".bold(), result.duration_ms);
    if let Some(ref path) = result.report_path {
        println!("  {} {}", "Report:".bold(), path.display());
    }
    println!();

    for warning in &result.warnings {
        println!("{} {}", "[WARNING]".yellow(), warning);
    }
    for error in &result.errors {
        println!("{} {}", "[ERROR]".red(), error);
    }
    if !result.warnings.is_empty() || !result.errors.is_empty() {
        println!();
    }

    if result.success {
        println!("{}", "[OK] Rollback completed successfully!".green());
    } else if !result.cancelled {
        println!("{}", "[FAILED] Rollback did not complete".bold().red());
    }
}
