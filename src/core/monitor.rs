//! Monitoring sessions.
//!
//! A [`SessionMonitor`] samples a [`MetricsCollector`] on a fixed interval,
//! checks every sample against static thresholds and keeps the alerts.
//! Finished sessions are appended to a capped JSON history file.

use crate::models::config::MonitorConfig;
use crate::models::monitor::{
    Alert, AlertMetric, AlertSeverity, AlertThresholds, DevelopmentMetrics, MonitoringSession,
    SummaryStats, SystemMetrics,
};
use crate::services::metrics::MetricsCollector;
use crate::Result;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Compare one pair of samples against the thresholds.
///
/// Alerts are not deduplicated: a metric that stays over its threshold
/// fires on every sample.
pub fn check_alerts(
    system: &SystemMetrics,
    development: &DevelopmentMetrics,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let timestamp = system.timestamp;

    let mut above = |metric: AlertMetric, value: f64, threshold: f64, label: &str| {
        if value > threshold {
            alerts.push(Alert {
                metric,
                severity: metric.severity(),
                message: format!("{} {:.1} exceeds threshold {:.1}", label, value, threshold),
                value,
                threshold,
                timestamp,
            });
        }
    };

    above(
        AlertMetric::MemoryPercent,
        system.memory_percent,
        thresholds.memory_percent,
        "Memory usage %",
    );
    above(
        AlertMetric::CpuPercent,
        system.cpu_percent,
        thresholds.cpu_percent,
        "CPU usage %",
    );
    above(
        AlertMetric::DiskPercent,
        system.disk_percent,
        thresholds.disk_percent,
        "Disk usage %",
    );
    above(
        AlertMetric::ProcessCount,
        f64::from(system.process_count),
        f64::from(thresholds.process_count),
        "Process count",
    );

    if development.safety_score < thresholds.safety_score {
        alerts.push(Alert {
            metric: AlertMetric::SafetyScore,
            severity: AlertMetric::SafetyScore.severity(),
            message: format!(
                "Uncommitted changes safety score {:.2} is below {:.2}",
                development.safety_score, thresholds.safety_score
            ),
            value: development.safety_score,
            threshold: thresholds.safety_score,
            timestamp: development.timestamp,
        });
    }

    alerts
}

/// Aggregate a finished session.
pub fn summarize(session: &MonitoringSession) -> SummaryStats {
    let samples = session.system_metrics.len();
    let end_time = session.end_time.unwrap_or_else(Utc::now);

    let mean = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };
    let max = |values: &[f64]| values.iter().copied().fold(0.0_f64, f64::max);

    let memory: Vec<f64> = session.system_metrics.iter().map(|m| m.memory_percent).collect();
    let cpu: Vec<f64> = session.system_metrics.iter().map(|m| m.cpu_percent).collect();
    let disk: Vec<f64> = session.system_metrics.iter().map(|m| m.disk_percent).collect();

    let count = |severity: AlertSeverity| {
        session
            .alerts_triggered
            .iter()
            .filter(|a| a.severity == severity)
            .count()
    };

    SummaryStats {
        samples,
        duration_secs: (end_time - session.start_time).num_seconds(),
        avg_memory_percent: mean(&memory),
        max_memory_percent: max(&memory),
        avg_cpu_percent: mean(&cpu),
        max_cpu_percent: max(&cpu),
        max_disk_percent: max(&disk),
        min_safety_score: session
            .development_metrics
            .iter()
            .map(|m| m.safety_score)
            .fold(1.0_f64, f64::min),
        alert_count: session.alerts_triggered.len(),
        critical_alerts: count(AlertSeverity::Critical),
        warning_alerts: count(AlertSeverity::Warning),
        info_alerts: count(AlertSeverity::Info),
    }
}

/// Samples a collector and builds a [`MonitoringSession`].
pub struct SessionMonitor<C: MetricsCollector> {
    collector: C,
    thresholds: AlertThresholds,
    interval: Duration,
    show_progress: bool,
}

impl<C: MetricsCollector> SessionMonitor<C> {
    /// Create a monitor using the interval and thresholds from `config`.
    pub fn new(collector: C, config: &MonitorConfig) -> Self {
        Self {
            collector,
            thresholds: config.thresholds.clone(),
            interval: Duration::from_secs(config.interval_secs.max(1)),
            show_progress: true,
        }
    }

    /// Override the sampling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable the progress bar.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Take up to `max_samples` samples, stopping early on Ctrl-C.
    pub async fn run(&mut self, max_samples: usize) -> Result<MonitoringSession> {
        let mut session = MonitoringSession::new(crate::core::executor::new_session_id());
        tracing::info!(
            "Monitoring session {} started ({} samples every {:?})",
            session.session_id,
            max_samples,
            self.interval
        );

        let pb = if self.show_progress {
            ProgressBar::new(max_samples as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let mut interval = tokio::time::interval(self.interval);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut taken = 0;
        while taken < max_samples {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut ctrl_c => {
                    tracing::info!("Monitoring interrupted after {} sample(s)", taken);
                    break;
                }
            }
            taken += 1;

            match self.sample() {
                Ok((system, development)) => {
                    let alerts = check_alerts(&system, &development, &self.thresholds);
                    for alert in &alerts {
                        tracing::warn!("[{}] {}", alert.severity, alert.message);
                    }
                    pb.set_message(format!(
                        "mem {:.0}% cpu {:.0}% safety {:.2}",
                        system.memory_percent, system.cpu_percent, development.safety_score
                    ));
                    session.system_metrics.push(system);
                    session.development_metrics.push(development);
                    session.alerts_triggered.extend(alerts);
                }
                Err(e) => tracing::warn!("Sample {} failed: {}", taken, e),
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        session.end_time = Some(Utc::now());
        session.summary_stats = Some(summarize(&session));
        Ok(session)
    }

    fn sample(&mut self) -> Result<(SystemMetrics, DevelopmentMetrics)> {
        let system = self.collector.system_metrics()?;
        let development = self.collector.development_metrics()?;
        Ok((system, development))
    }
}

/// Load the session history. A missing file is an empty history.
pub fn load_history(path: &Path) -> Result<Vec<MonitoringSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let sessions: Vec<MonitoringSession> = serde_json::from_str(&content)?;
    Ok(sessions)
}

/// Append a session, evicting the oldest beyond `max_sessions`.
pub fn append_history(path: &Path, session: &MonitoringSession, max_sessions: usize) -> Result<()> {
    let mut sessions = load_history(path)?;
    sessions.push(session.clone());
    if sessions.len() > max_sessions {
        let excess = sessions.len() - max_sessions;
        sessions.drain(..excess);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&sessions)?;
    fs::write(path, json)?;

    tracing::info!("Monitoring history saved to {:?} ({} sessions)", path, sessions.len());
    Ok(())
}

/// Most recent sessions first.
pub fn session_history(path: &Path, limit: usize) -> Result<Vec<MonitoringSession>> {
    let mut sessions = load_history(path)?;
    sessions.reverse();
    sessions.truncate(limit);
    Ok(sessions)
}
