//! Integration tests against a real git repository
//!
//! Tests cover:
//! - Repository discovery
//! - Planning against commits, branches and tags
//! - End-to-end rollback with backup branch and stash
//!
//! Every test returns early when git is not installed.

mod common;

use cognitive_partner::core::executor::RollbackExecutor;
use cognitive_partner::core::planner::RollbackPlanner;
use cognitive_partner::models::config::RollbackConfig;
use cognitive_partner::models::rollback::{ExecuteOptions, ExecutionOutcome, TargetType};
use cognitive_partner::services::git::{GitCli, Vcs};
use common::{git, git_available, init_repo};
use std::fs;
use tempfile::TempDir;

// ========== DISCOVERY TESTS ==========

#[test]
fn test_discover_from_subdirectory() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    init_repo(temp_dir.path(), 1);
    let nested = temp_dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let repo = GitCli::discover(&nested).unwrap();
    assert_eq!(
        repo.workdir().canonicalize().unwrap(),
        temp_dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_repository_queries() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    init_repo(temp_dir.path(), 3);
    git(temp_dir.path(), &["tag", "v0.1", "HEAD~1"]);

    let repo = GitCli::discover(temp_dir.path()).unwrap();
    let head = repo.head_commit().unwrap();
    assert_eq!(head.len(), 40);
    assert!(repo.current_branch().unwrap().is_some());
    assert!(repo.tag_exists("v0.1").unwrap());
    assert!(!repo.branch_exists("v0.1").unwrap());
    assert!(repo.resolve_commit("nope").unwrap().is_none());
    assert!(!repo.has_uncommitted_changes().unwrap());

    let first = repo.resolve_commit("HEAD~2").unwrap().unwrap();
    assert!(repo.is_ancestor(&first, &head).unwrap());
    assert!(!repo.is_ancestor(&head, &first).unwrap());
    assert_eq!(repo.commits_between(&first, "HEAD").unwrap().len(), 2);

    let changed = repo.changed_files(&first, "HEAD").unwrap();
    assert_eq!(changed, vec!["file1.txt".to_string(), "file2.txt".to_string()]);
    assert!(repo.path_exists_at(&first, "file0.txt").unwrap());
    assert!(!repo.path_exists_at(&first, "file2.txt").unwrap());

    let recent = repo.recent_commits(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].hash, head);
    assert_eq!(recent[0].message, "commit 2");
}

// ========== PLANNING TESTS ==========

#[test]
fn test_plan_against_tag() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    init_repo(temp_dir.path(), 4);
    git(temp_dir.path(), &["tag", "release", "HEAD~3"]);

    let repo = GitCli::discover(temp_dir.path()).unwrap();
    let planner = RollbackPlanner::new(&repo);

    let target = planner.analyze_target("release").unwrap();
    assert!(target.is_valid, "errors: {:?}", target.validation_errors);
    assert_eq!(target.target_type, TargetType::Tag);
    assert_eq!(target.commit_message.as_deref(), Some("commit 0"));

    let plan = planner.create_plan(&target, true).unwrap();
    assert_eq!(plan.commits_to_lose.len(), 3);
    assert_eq!(plan.files_to_change.len(), 3);

    let head_target = planner.analyze_target("HEAD").unwrap();
    assert!(!head_target.is_valid);
}

#[test]
fn test_list_targets_includes_branches_and_tags() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    init_repo(temp_dir.path(), 3);
    git(temp_dir.path(), &["tag", "v1", "HEAD~1"]);
    git(temp_dir.path(), &["branch", "feature", "HEAD~2"]);

    let repo = GitCli::discover(temp_dir.path()).unwrap();
    let candidates = RollbackPlanner::new(&repo).list_targets(10).unwrap();

    assert!(candidates
        .iter()
        .any(|c| c.reference == "feature" && c.target_type == TargetType::Branch));
    assert!(candidates
        .iter()
        .any(|c| c.reference == "v1" && c.target_type == TargetType::Tag));
}

// ========== EXECUTION TESTS ==========

#[test]
fn test_end_to_end_rollback_keeps_work_recoverable() {
    if !git_available() {
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let logs = TempDir::new().unwrap();
    init_repo(temp_dir.path(), 3);

    let repo = GitCli::discover(temp_dir.path()).unwrap();
    let workdir = repo.workdir().to_path_buf();
    let original_head = repo.head_commit().unwrap();
    let target_commit = repo.resolve_commit("HEAD~2").unwrap().unwrap();

    // Uncommitted edit to a tracked file
    fs::write(workdir.join("file0.txt"), "edited\n").unwrap();

    let config = RollbackConfig {
        logs_dir: logs.path().to_path_buf(),
        ..Default::default()
    };
    let planner = RollbackPlanner::with_config(&repo, config.clone());
    let target = planner.analyze_target(&target_commit).unwrap();
    let plan = planner.create_plan(&target, true).unwrap();
    assert!(plan.has_uncommitted_changes);
    let backup = plan.backup_branch_name.clone().unwrap();

    let options = ExecuteOptions {
        run_validation: true,
        ..Default::default()
    };
    let outcome = RollbackExecutor::with_config(&repo, config)
        .execute(plan, options)
        .unwrap();
    let result = match outcome {
        ExecutionOutcome::Executed(result) => result,
        ExecutionOutcome::Simulated(_) => panic!("expected a real execution"),
    };

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.backup_created);
    assert!(result.stash_created);
    assert!(result.validation_passed, "warnings: {:?}", result.warnings);
    assert!(result.report_path.unwrap().exists());

    assert_eq!(repo.head_commit().unwrap(), target_commit);
    assert!(!workdir.join("file2.txt").exists());
    assert_eq!(fs::read_to_string(workdir.join("file0.txt")).unwrap(), "content 0\n");
    assert_eq!(repo.resolve_commit(&backup).unwrap().unwrap(), original_head);
    assert!(!git(&workdir, &["stash", "list"]).is_empty());
}
