//! Command line argument definitions.

use crate::output::format::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cognitive Partner - safe rollbacks, monitoring and project memory
#[derive(Parser, Debug)]
#[command(name = "cognitive-partner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Output format for backend results
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Roll the repository back to an earlier commit, branch or tag
    Rollback {
        /// Commit, branch or tag to roll back to
        #[arg(long, value_name = "REF", required_unless_present = "list_targets")]
        target: Option<String>,

        /// Show what would be done without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Run even if the plan is unsafe
        #[arg(long)]
        force: bool,

        /// Do not create a backup branch
        #[arg(long)]
        no_backup: bool,

        /// Run post-rollback validation
        #[arg(long)]
        validate: bool,

        /// List recent commits, branches and tags
        #[arg(long)]
        list_targets: bool,

        /// Repository path
        #[arg(long, value_name = "PATH", default_value = ".")]
        repo: PathBuf,
    },

    /// Sample system and development metrics and raise alerts
    Monitor {
        #[command(subcommand)]
        action: Option<MonitorAction>,

        /// Seconds between samples
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Number of samples to take
        #[arg(long, value_name = "N")]
        samples: Option<usize>,

        /// Memory usage alert threshold (%)
        #[arg(long)]
        memory_threshold: Option<f64>,

        /// CPU usage alert threshold (%)
        #[arg(long)]
        cpu_threshold: Option<f64>,

        /// Disk usage alert threshold (%)
        #[arg(long)]
        disk_threshold: Option<f64>,

        /// Minimum safety score of uncommitted changes
        #[arg(long)]
        safety_threshold: Option<f64>,

        /// Process count alert threshold
        #[arg(long)]
        process_threshold: Option<u32>,

        /// Repository to watch
        #[arg(long, value_name = "PATH", default_value = ".")]
        repo: PathBuf,
    },

    /// Manage stored memories
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Work with the knowledge graph
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },

    /// Sync memories with a notes vault
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Generate documentation
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Record development checkpoints
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Abstract sensitive content and report its safety score
    Abstract {
        /// Text to abstract
        #[arg(value_name = "TEXT", required_unless_present = "file")]
        text: Option<String>,

        /// File or directory to abstract
        #[arg(long, value_name = "PATH", conflicts_with = "text")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MonitorAction {
    /// Show previous monitoring sessions
    History {
        /// Number of sessions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Store a memory
    Store {
        /// Memory content
        #[arg(value_name = "CONTENT")]
        content: String,

        /// Memory type
        #[arg(long = "type", default_value = "note")]
        memory_type: String,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Importance between 0 and 1
        #[arg(long)]
        importance: Option<f32>,
    },

    /// Show a memory
    Get {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List memories
    List {
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Only this memory type
        #[arg(long = "type")]
        memory_type: Option<String>,
    },

    /// Search memories
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(long, default_value = "10")]
        limit: usize,

        /// Only this memory type
        #[arg(long = "type")]
        memory_type: Option<String>,
    },

    /// Delete a memory
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphAction {
    /// Build the graph from stored memories
    Build {
        /// Discard the existing graph first
        #[arg(long)]
        rebuild: bool,
    },

    /// Query the graph
    Query {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(long)]
        depth: Option<u32>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export the whole graph
    Export {
        /// Export format requested from the backend
        #[arg(long, default_value = "json")]
        export_format: String,
    },

    /// Extract the subgraph around a concept
    Subgraph {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(long, default_value = "2")]
        depth: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum VaultAction {
    /// Sync memories with the vault
    Sync {
        /// Vault directory (backend default if omitted)
        #[arg(long, value_name = "PATH")]
        path: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// Generate documentation for a module or path
    Generate {
        #[arg(value_name = "TARGET")]
        target: String,

        /// Kind of documentation
        #[arg(long, default_value = "api")]
        doc_type: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckpointAction {
    /// Create a checkpoint
    Create {
        #[arg(value_name = "MESSAGE")]
        message: String,

        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rollback_requires_target_or_list() {
        assert!(Cli::try_parse_from(["cognitive-partner", "rollback"]).is_err());
        assert!(Cli::try_parse_from(["cognitive-partner", "rollback", "--list-targets"]).is_ok());

        let cli = Cli::try_parse_from([
            "cognitive-partner",
            "rollback",
            "--target",
            "v1.0",
            "--dry-run",
            "--no-backup",
        ])
        .unwrap();
        match cli.command {
            Commands::Rollback {
                target,
                dry_run,
                no_backup,
                force,
                ..
            } => {
                assert_eq!(target.as_deref(), Some("v1.0"));
                assert!(dry_run && no_backup && !force);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_format_and_tags() {
        let cli = Cli::try_parse_from([
            "cognitive-partner",
            "memory",
            "store",
            "Prefer thiserror in libraries",
            "--tags",
            "rust,errors",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Memory {
                action: MemoryAction::Store { tags, memory_type, .. },
            } => {
                assert_eq!(tags, vec!["rust", "errors"]);
                assert_eq!(memory_type, "note");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_monitor_history() {
        let cli =
            Cli::try_parse_from(["cognitive-partner", "monitor", "history", "--limit", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Monitor {
                action: Some(MonitorAction::History { limit: 3 }),
                ..
            }
        ));
    }
}
