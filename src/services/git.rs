//! Git access.
//!
//! The planner and executor only talk to the [`Vcs`] trait. [`GitCli`]
//! implements it by running the `git` binary in the repository's work tree.

use crate::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Commit metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// Version-control operations needed for rollback and monitoring.
///
/// Mutating methods are `create_branch`, `stash_push`, `stash_apply` and
/// `reset_hard`; everything else only reads.
pub trait Vcs: Send + Sync {
    /// Repository work tree.
    fn workdir(&self) -> &Path;

    /// Resolve a reference to a full commit hash, `None` if it does not resolve.
    fn resolve_commit(&self, reference: &str) -> Result<Option<String>>;

    /// Full hash of HEAD.
    fn head_commit(&self) -> Result<String>;

    /// Checked-out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    fn branch_exists(&self, name: &str) -> Result<bool>;

    fn tag_exists(&self, name: &str) -> Result<bool>;

    fn commit_info(&self, commit: &str) -> Result<CommitInfo>;

    /// Whether `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Whether tracked files have uncommitted modifications.
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Number of tracked files with uncommitted modifications.
    fn uncommitted_file_count(&self) -> Result<usize>;

    /// Diff of the work tree against HEAD.
    fn uncommitted_diff(&self) -> Result<String>;

    /// Abbreviated hashes in `from..to`, newest first.
    fn commits_between(&self, from: &str, to: &str) -> Result<Vec<String>>;

    /// Paths that differ between two commits.
    fn changed_files(&self, from: &str, to: &str) -> Result<Vec<String>>;

    /// Whether `path` exists in the tree of `commit`.
    fn path_exists_at(&self, commit: &str, path: &str) -> Result<bool>;

    /// Most recent commits reachable from HEAD.
    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>>;

    fn branches(&self) -> Result<Vec<String>>;

    fn tags(&self) -> Result<Vec<String>>;

    /// Create branch `name` pointing at `commit`.
    fn create_branch(&self, name: &str, commit: &str) -> Result<()>;

    /// Stash tracked changes; returns the stash commit hash, `None` if nothing was stashed.
    fn stash_push(&self, message: &str) -> Result<Option<String>>;

    /// Re-apply a stash commit to the work tree.
    fn stash_apply(&self, stash_commit: &str) -> Result<()>;

    /// Move the branch pointer and work tree to `commit`.
    fn reset_hard(&self, commit: &str) -> Result<()>;
}

/// [`Vcs`] backed by the `git` command-line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

/// Field separator used in `--format` strings.
const FIELD_SEP: char = '\u{1f}';

impl GitCli {
    /// Open the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(crate::Error::PathNotFound(path.display().to_string()));
        }

        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .map_err(|_| crate::Error::GitNotFound)?;

        if !output.status.success() {
            return Err(crate::Error::NotARepository(path.display().to_string()));
        }

        let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Self {
            workdir: PathBuf::from(toplevel),
        })
    }

    /// Whether the `git` binary can be run.
    pub fn is_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Installed git version, e.g. `2.43.0`.
    pub fn version() -> Result<String> {
        let output = Command::new("git")
            .arg("--version")
            .output()
            .map_err(|_| crate::Error::GitNotFound)?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text
            .trim()
            .trim_start_matches("git version ")
            .to_string())
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| crate::Error::git(args.join(" "), e.to_string()))
    }

    /// Run git and return trimmed stdout, failing on non-zero exit.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(crate::Error::git(args.join(" "), stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run git and report whether it exited successfully.
    fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.output(args)?.status.success())
    }

    fn parse_commit_line(line: &str) -> Result<CommitInfo> {
        let fields: Vec<&str> = line.split(FIELD_SEP).collect();
        if fields.len() != 4 {
            return Err(crate::Error::git("log", format!("unexpected format: {}", line)));
        }
        let date = DateTime::parse_from_rfc3339(fields[3])
            .map_err(|e| crate::Error::git("log", format!("bad date '{}': {}", fields[3], e)))?
            .with_timezone(&Utc);

        Ok(CommitInfo {
            hash: fields[0].to_string(),
            short_hash: fields[1].to_string(),
            message: fields[2].to_string(),
            date,
        })
    }

    fn lines(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

fn commit_format() -> String {
    format!("--format=%H{0}%h{0}%s{0}%cI", FIELD_SEP)
}

impl Vcs for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn resolve_commit(&self, reference: &str) -> Result<Option<String>> {
        let spec = format!("{}^{{commit}}", reference);
        let output = self.output(&["rev-parse", "--verify", "--quiet", &spec])?;
        if !output.status.success() {
            return Ok(None);
        }
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!hash.is_empty()).then_some(hash))
    }

    fn head_commit(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"])
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let name = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok((name != "HEAD").then_some(name))
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", name);
        self.succeeds(&["show-ref", "--verify", "--quiet", &reference])
    }

    fn tag_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/tags/{}", name);
        self.succeeds(&["show-ref", "--verify", "--quiet", &reference])
    }

    fn commit_info(&self, commit: &str) -> Result<CommitInfo> {
        let line = self.run(&["show", "-s", &commit_format(), commit])?;
        Self::parse_commit_line(line.trim())
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let args = ["merge-base", "--is-ancestor", ancestor, descendant];
        let output = self.output(&args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(crate::Error::git(
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(self.uncommitted_file_count()? > 0)
    }

    fn uncommitted_file_count(&self) -> Result<usize> {
        let status = self.run(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(Self::lines(&status).len())
    }

    fn uncommitted_diff(&self) -> Result<String> {
        self.run(&["diff", "HEAD"])
    }

    fn commits_between(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let range = format!("{}..{}", from, to);
        let output = self.run(&["log", "--format=%h", &range])?;
        Ok(Self::lines(&output))
    }

    fn changed_files(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let output = self.run(&["diff", "--name-only", from, to])?;
        Ok(Self::lines(&output))
    }

    fn path_exists_at(&self, commit: &str, path: &str) -> Result<bool> {
        let object = format!("{}:{}", commit, path);
        self.succeeds(&["cat-file", "-e", &object])
    }

    fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        let count = format!("-{}", limit);
        let output = self.run(&["log", &count, &commit_format()])?;
        Self::lines(&output)
            .iter()
            .map(|line| Self::parse_commit_line(line))
            .collect()
    }

    fn branches(&self) -> Result<Vec<String>> {
        let output = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(Self::lines(&output))
    }

    fn tags(&self) -> Result<Vec<String>> {
        let output = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/tags"])?;
        Ok(Self::lines(&output))
    }

    fn create_branch(&self, name: &str, commit: &str) -> Result<()> {
        self.run(&["branch", name, commit])?;
        tracing::info!("Created branch {} at {}", name, commit);
        Ok(())
    }

    fn stash_push(&self, message: &str) -> Result<Option<String>> {
        let before = self.resolve_commit("refs/stash")?;
        self.run(&["stash", "push", "-m", message])?;
        let after = self.resolve_commit("refs/stash")?;

        if after.is_some() && after != before {
            Ok(after)
        } else {
            Ok(None)
        }
    }

    fn stash_apply(&self, stash_commit: &str) -> Result<()> {
        self.run(&["stash", "apply", stash_commit])?;
        Ok(())
    }

    fn reset_hard(&self, commit: &str) -> Result<()> {
        self.run(&["reset", "--hard", commit])?;
        tracing::info!("Reset to {}", commit);
        Ok(())
    }
}
