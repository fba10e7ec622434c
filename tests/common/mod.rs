//! Shared test fixtures.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use cognitive_partner::services::git::{CommitInfo, Vcs};
use cognitive_partner::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A mutating call recorded by [`ScriptedRepo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateBranch { name: String, commit: String },
    StashPush { message: String },
    StashApply { commit: String },
    ResetHard { commit: String },
}

/// In-memory repository with scripted answers.
pub struct ScriptedRepo {
    pub workdir: PathBuf,
    pub head: String,
    pub refs: HashMap<String, String>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub ancestors: Vec<String>,
    pub dates: HashMap<String, DateTime<Utc>>,
    pub dirty: bool,
    pub dirty_after_reset: bool,
    pub lost_commits: Vec<String>,
    pub changed_files: Vec<String>,
    pub fail_branch: bool,
    pub fail_stash: bool,
    pub fail_reset: bool,
    pub fail_stash_apply: bool,
    /// Raised once the backup branch is created.
    pub cancel_after_backup: Option<Arc<AtomicBool>>,
    /// Raised once the stash is pushed.
    pub cancel_after_stash: Option<Arc<AtomicBool>>,
    pub mutations: Mutex<Vec<Mutation>>,
}

pub const HEAD: &str = "1111111111111111111111111111111111111111";
pub const TARGET: &str = "2222222222222222222222222222222222222222";
pub const STASH: &str = "5555555555555555555555555555555555555555";

impl ScriptedRepo {
    /// A clean repository where `TARGET` (also reachable as `v1.0`) is an ancestor of HEAD.
    pub fn new(workdir: &Path) -> Self {
        let mut refs = HashMap::new();
        refs.insert("HEAD".to_string(), HEAD.to_string());
        refs.insert("main".to_string(), HEAD.to_string());
        refs.insert(HEAD.to_string(), HEAD.to_string());
        refs.insert(TARGET.to_string(), TARGET.to_string());
        refs.insert("2222222".to_string(), TARGET.to_string());
        refs.insert("v1.0".to_string(), TARGET.to_string());

        Self {
            workdir: workdir.to_path_buf(),
            head: HEAD.to_string(),
            refs,
            branches: vec!["main".to_string()],
            tags: vec!["v1.0".to_string()],
            ancestors: vec![TARGET.to_string()],
            dates: HashMap::new(),
            dirty: false,
            dirty_after_reset: false,
            lost_commits: vec!["c3".to_string(), "c2".to_string(), "c1".to_string()],
            changed_files: vec!["src/lib.rs".to_string(), "README.md".to_string()],
            fail_branch: false,
            fail_stash: false,
            fail_reset: false,
            fail_stash_apply: false,
            cancel_after_backup: None,
            cancel_after_stash: None,
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    fn record(&self, mutation: Mutation) {
        self.mutations.lock().unwrap().push(mutation);
    }

    fn reset_done(&self) -> bool {
        self.mutations()
            .iter()
            .any(|m| matches!(m, Mutation::ResetHard { .. }))
    }
}

impl Vcs for ScriptedRepo {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn resolve_commit(&self, reference: &str) -> Result<Option<String>> {
        Ok(self.refs.get(reference).cloned())
    }

    fn head_commit(&self) -> Result<String> {
        Ok(self.head.clone())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(Some("main".to_string()))
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.branches.iter().any(|b| b == name))
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tags.iter().any(|t| t == name))
    }

    fn commit_info(&self, commit: &str) -> Result<CommitInfo> {
        Ok(CommitInfo {
            hash: commit.to_string(),
            short_hash: commit.chars().take(7).collect(),
            message: format!("Commit {}", &commit[..commit.len().min(7)]),
            date: self.dates.get(commit).copied().unwrap_or_else(Utc::now),
        })
    }

    fn is_ancestor(&self, ancestor: &str, _descendant: &str) -> Result<bool> {
        Ok(self.ancestors.iter().any(|a| a == ancestor))
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        if self.reset_done() {
            Ok(self.dirty_after_reset)
        } else {
            Ok(self.dirty)
        }
    }

    fn uncommitted_file_count(&self) -> Result<usize> {
        Ok(usize::from(self.has_uncommitted_changes()?))
    }

    fn uncommitted_diff(&self) -> Result<String> {
        Ok(String::new())
    }

    fn commits_between(&self, _from: &str, _to: &str) -> Result<Vec<String>> {
        Ok(self.lost_commits.clone())
    }

    fn changed_files(&self, _from: &str, _to: &str) -> Result<Vec<String>> {
        Ok(self.changed_files.clone())
    }

    fn path_exists_at(&self, _commit: &str, path: &str) -> Result<bool> {
        Ok(self.changed_files.iter().any(|f| f == path))
    }

    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        [HEAD, TARGET]
            .iter()
            .take(limit)
            .map(|c| self.commit_info(c))
            .collect()
    }

    fn branches(&self) -> Result<Vec<String>> {
        Ok(self.branches.clone())
    }

    fn tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    fn create_branch(&self, name: &str, commit: &str) -> Result<()> {
        if self.fail_branch {
            return Err(Error::git("branch", "a branch with that name already exists"));
        }
        self.record(Mutation::CreateBranch {
            name: name.to_string(),
            commit: commit.to_string(),
        });
        if let Some(ref flag) = self.cancel_after_backup {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn stash_push(&self, message: &str) -> Result<Option<String>> {
        if self.fail_stash {
            return Err(Error::git("stash push", "cannot save the current index state"));
        }
        self.record(Mutation::StashPush {
            message: message.to_string(),
        });
        if let Some(ref flag) = self.cancel_after_stash {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(Some(STASH.to_string()))
    }

    fn stash_apply(&self, stash_commit: &str) -> Result<()> {
        if self.fail_stash_apply {
            return Err(Error::git("stash apply", "conflict"));
        }
        self.record(Mutation::StashApply {
            commit: stash_commit.to_string(),
        });
        Ok(())
    }

    fn reset_hard(&self, commit: &str) -> Result<()> {
        if self.fail_reset {
            return Err(Error::git("reset --hard", "unable to unlink old 'src/lib.rs'"));
        }
        self.record(Mutation::ResetHard {
            commit: commit.to_string(),
        });
        Ok(())
    }
}

/// Whether the git binary can be used for real-repository tests.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository with `commits` commits, each adding `file<i>.txt`.
pub fn init_repo(dir: &Path, commits: usize) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    for i in 0..commits {
        std::fs::write(dir.join(format!("file{}.txt", i)), format!("content {}\n", i)).unwrap();
        git(dir, &["add", "."]);
        git(dir, &["commit", "-q", "-m", &format!("commit {}", i)]);
    }
}
