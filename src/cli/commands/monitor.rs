//! Monitor command implementation.

use crate::core::abstraction::AbstractionEngine;
use crate::core::monitor::{self, SessionMonitor};
use crate::models::config::Config;
use crate::models::monitor::{AlertSeverity, AlertThresholds, MonitoringSession};
use crate::output::format::OutputFormat;
use crate::services::git::{GitCli, Vcs};
use crate::services::metrics::ProcCollector;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Command-line overrides for a monitoring run.
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    pub interval: Option<u64>,
    pub samples: Option<usize>,
    pub memory_threshold: Option<f64>,
    pub cpu_threshold: Option<f64>,
    pub disk_threshold: Option<f64>,
    pub safety_threshold: Option<f64>,
    pub process_threshold: Option<u32>,
    pub repo: PathBuf,
}

impl MonitorOptions {
    /// Thresholds from the config with command-line overrides applied.
    pub fn thresholds(&self, base: &AlertThresholds) -> AlertThresholds {
        AlertThresholds {
            memory_percent: self.memory_threshold.unwrap_or(base.memory_percent),
            cpu_percent: self.cpu_threshold.unwrap_or(base.cpu_percent),
            disk_percent: self.disk_threshold.unwrap_or(base.disk_percent),
            safety_score: self.safety_threshold.unwrap_or(base.safety_score),
            process_count: self.process_threshold.unwrap_or(base.process_count),
        }
    }
}

/// Run a monitoring session and append it to the history.
pub async fn monitor(options: MonitorOptions, config: &Config) -> Result<bool> {
    println!("{}", "[MONITOR] Monitoring session".bold().cyan());
    println!();

    let mut monitor_config = config.monitor.clone();
    monitor_config.thresholds = options.thresholds(&config.monitor.thresholds);
    if let Some(interval) = options.interval {
        monitor_config.interval_secs = interval;
    }
    let samples = options.samples.unwrap_or(monitor_config.samples);

    let mut collector = ProcCollector::new(&options.repo);
    match GitCli::discover(&options.repo) {
        Ok(repo) => {
            println!("[INFO] Watching repository: {}", repo.workdir().display());
            collector =
                collector.with_repo(Box::new(repo), AbstractionEngine::from_config(&config.output));
        }
        Err(e) => {
            println!(
                "{} No repository to watch ({}); development metrics disabled",
                "[WARNING]".yellow(),
                e
            );
        }
    }

    println!(
        "[INFO] {} samples every {}s (Ctrl-C to stop early)",
        samples,
        monitor_config.interval_secs.max(1)
    );
    println!();

    let mut session_monitor = SessionMonitor::new(collector, &monitor_config);
    let session = session_monitor.run(samples).await?;

    print_session(&session);

    if let Err(e) =
        monitor::append_history(&monitor_config.history_path, &session, monitor_config.max_history)
    {
        println!("{} Could not save history: {}", "[WARNING]".yellow(), e);
    }

    Ok(true)
}

/// Show recent sessions.
pub async fn history(limit: usize, config: &Config, format: OutputFormat) -> Result<bool> {
    let sessions = monitor::session_history(&config.monitor.history_path, limit)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(true);
    }

    println!("{}", "[MONITOR] Session history".bold().cyan());
    println!();

    if sessions.is_empty() {
        println!("No monitoring sessions found.");
        return Ok(true);
    }

    println!(
        "{:<26} {:<20} {:>8} {:>8} {:>8} {:>8}",
        "SESSION".bold(),
        "STARTED".bold(),
        "SAMPLES".bold(),
        "MAX MEM".bold(),
        "MAX CPU".bold(),
        "ALERTS".bold()
    );
    for session in &sessions {
        let stats = session.summary_stats.clone().unwrap_or_default();
        println!(
            "{:<26} {:<20} {:>8} {:>7.1}% {:>7.1}% {:>8}",
            session.session_id,
            session.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            stats.samples,
            stats.max_memory_percent,
            stats.max_cpu_percent,
            stats.alert_count
        );
    }
    Ok(true)
}

fn print_session(session: &MonitoringSession) {
    println!("{}", "[Session Summary]".bold().green());
    println!("  {} {}", "Session:".bold(), session.session_id);

    let Some(ref stats) = session.summary_stats else {
        return;
    };
    println!("  {} {}", "Samples:".bold(), stats.samples);
    println!("  {} {}s", "Duration:".bold(), stats.duration_secs);
    println!(
        "  {} avg {:.1}% / max {:.1}%",
        "Memory:".bold(),
        stats.avg_memory_percent,
        stats.max_memory_percent
    );
    println!(
        "  {} avg {:.1}% / max {:.1}%",
        "CPU:".bold(),
        stats.avg_cpu_percent,
        stats.max_cpu_percent
    );
    println!("  {} max {:.1}%", "Disk:".bold(), stats.max_disk_percent);
    println!("  {} min {:.2}", "Safety score:".bold(), stats.min_safety_score);
    println!(
        "  {} {} ({} critical, {} warning, {} info)",
        "Alerts:".bold(),
        stats.alert_count,
        stats.critical_alerts,
        stats.warning_alerts,
        stats.info_alerts
    );
    println!();

    for alert in &session.alerts_triggered {
        let tag = match alert.severity {
            AlertSeverity::Critical => "[CRITICAL]".bold().red(),
            AlertSeverity::Warning => "[WARNING]".yellow(),
            AlertSeverity::Info => "[INFO]".normal(),
        };
        println!(
            "{} {} {}",
            tag,
            alert.timestamp.format("%H:%M:%S"),
            alert.message
        );
    }
}
