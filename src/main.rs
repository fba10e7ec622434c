//! Cognitive Partner CLI
//!
//! A command-line coding partner: safe git rollbacks, development
//! monitoring and access to the project memory backend.

use clap::Parser;
use cognitive_partner::cli::{
    args::{
        CheckpointAction, Cli, Commands, DocsAction, GraphAction, MemoryAction, MonitorAction,
        VaultAction,
    },
    commands::{
        abstraction, graph, memory,
        monitor::{self, MonitorOptions},
        rollback::{self, RollbackOptions},
        workspace,
    },
};
use cognitive_partner::core::abstraction::AbstractionEngine;
use cognitive_partner::logging;
use cognitive_partner::models::config::{self, Config};
use cognitive_partner::preflight::{self, Requirement};
use colored::Colorize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Logging is not up yet, so config problems are printed directly
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{} Ignoring invalid config {}: {}",
                "[WARNING]".yellow(),
                config::config_path().display(),
                e
            );
            config::env_config()
        }
    };

    // Initialize logging
    logging::init_logging(cli.verbose, AbstractionEngine::from_config(&config.output));

    // Run preflight checks unless skipped
    if !cli.skip_preflight {
        run_preflight_checks(requirements(&cli.command), &config).await?;
    }

    let format = cli.format;
    let result = match cli.command {
        Commands::Rollback {
            target,
            dry_run,
            force,
            no_backup,
            validate,
            list_targets,
            repo,
        } => {
            let options = RollbackOptions {
                target,
                dry_run,
                force,
                no_backup,
                validate,
                list_targets,
                repo,
            };
            rollback::rollback(options, &config).await
        }

        Commands::Monitor {
            action: Some(MonitorAction::History { limit }),
            ..
        } => monitor::history(limit, &config, format).await,

        Commands::Monitor {
            action: None,
            interval,
            samples,
            memory_threshold,
            cpu_threshold,
            disk_threshold,
            safety_threshold,
            process_threshold,
            repo,
        } => {
            let options = MonitorOptions {
                interval,
                samples,
                memory_threshold,
                cpu_threshold,
                disk_threshold,
                safety_threshold,
                process_threshold,
                repo,
            };
            monitor::monitor(options, &config).await
        }

        Commands::Memory { action } => match action {
            MemoryAction::Store {
                content,
                memory_type,
                tags,
                importance,
            } => memory::store(&content, &memory_type, tags, importance, &config, format).await,
            MemoryAction::Get { id } => memory::get(&id, &config, format).await,
            MemoryAction::List { limit, memory_type } => {
                memory::list(limit, memory_type.as_deref(), &config, format).await
            }
            MemoryAction::Search {
                query,
                limit,
                memory_type,
            } => memory::search(&query, limit, memory_type, &config, format).await,
            MemoryAction::Delete { id } => memory::delete(&id, &config, format).await,
        },

        Commands::Graph { action } => match action {
            GraphAction::Build { rebuild } => graph::build(rebuild, &config, format).await,
            GraphAction::Query {
                query,
                depth,
                limit,
            } => graph::query(&query, depth, limit, &config, format).await,
            GraphAction::Export { export_format } => {
                graph::export(&export_format, &config, format).await
            }
            GraphAction::Subgraph { query, depth } => {
                graph::subgraph(&query, depth, &config, format).await
            }
        },

        Commands::Vault {
            action: VaultAction::Sync { path },
        } => workspace::vault_sync(path.as_deref(), &config, format).await,

        Commands::Docs {
            action: DocsAction::Generate { target, doc_type },
        } => workspace::docs_generate(&target, &doc_type, &config, format).await,

        Commands::Checkpoint {
            action: CheckpointAction::Create { message, tags },
        } => workspace::checkpoint_create(&message, &tags, &config, format).await,

        Commands::Abstract { text, file } => match (file, text) {
            (Some(path), _) => abstraction::abstract_path(&path, &config, format).await,
            (None, Some(text)) => abstraction::abstract_text(&text, &config, format).await,
            (None, None) => Err(cognitive_partner::Error::other(
                "Provide TEXT or --file PATH",
            )),
        },
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red(), e);
            std::process::exit(1);
        }
    }
}

/// Dependencies each command needs.
fn requirements(command: &Commands) -> &'static [Requirement] {
    match command {
        Commands::Rollback { .. } => &[Requirement::Git],
        Commands::Monitor { .. } | Commands::Abstract { .. } => &[],
        Commands::Memory { .. }
        | Commands::Graph { .. }
        | Commands::Vault { .. }
        | Commands::Docs { .. }
        | Commands::Checkpoint { .. } => &[Requirement::Api],
    }
}

/// Run preflight checks and exit if any fail.
async fn run_preflight_checks(requirements: &[Requirement], config: &Config) -> anyhow::Result<()> {
    if requirements.is_empty() {
        return Ok(());
    }

    println!("{}", "Running preflight checks...".bold());
    println!();

    let results = preflight::run_preflight_checks(requirements, &config.api).await;
    preflight::print_results(&results);

    println!();

    if !preflight::all_passed(&results) {
        anyhow::bail!("Preflight checks failed. Fix the issues above and try again.");
    }

    Ok(())
}
