//! Monitoring session data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sample of host metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub timestamp: DateTime<Utc>,
    pub memory_percent: f64,
    pub cpu_percent: f64,
    pub disk_percent: f64,
    pub process_count: u32,
    /// 1-minute load average, if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<f64>,
}

/// One sample of development-environment metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentMetrics {
    pub timestamp: DateTime<Utc>,
    /// Safety score of the uncommitted diff.
    pub safety_score: f64,
    pub uncommitted_files: usize,
    /// Substitutions the abstraction engine made in the diff.
    pub sensitive_matches: usize,
}

/// Alert severity, fixed per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Which metric an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    MemoryPercent,
    CpuPercent,
    DiskPercent,
    SafetyScore,
    ProcessCount,
}

impl AlertMetric {
    /// Severity emitted for a breach of this metric.
    pub fn severity(self) -> AlertSeverity {
        match self {
            AlertMetric::MemoryPercent | AlertMetric::CpuPercent => AlertSeverity::Warning,
            AlertMetric::DiskPercent | AlertMetric::SafetyScore => AlertSeverity::Critical,
            AlertMetric::ProcessCount => AlertSeverity::Info,
        }
    }
}

impl fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertMetric::MemoryPercent => "memory",
            AlertMetric::CpuPercent => "cpu",
            AlertMetric::DiskPercent => "disk",
            AlertMetric::SafetyScore => "safety_score",
            AlertMetric::ProcessCount => "process_count",
        };
        write!(f, "{}", name)
    }
}

/// A threshold breach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub metric: AlertMetric,
    pub severity: AlertSeverity,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

/// Static alert thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Alert when memory usage exceeds this percentage.
    pub memory_percent: f64,
    /// Alert when CPU usage exceeds this percentage.
    pub cpu_percent: f64,
    /// Alert when disk usage exceeds this percentage.
    pub disk_percent: f64,
    /// Alert when the diff safety score drops below this.
    pub safety_score: f64,
    /// Alert when the process count exceeds this.
    pub process_count: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            memory_percent: 85.0,
            cpu_percent: 90.0,
            disk_percent: 90.0,
            safety_score: 0.8,
            process_count: 500,
        }
    }
}

/// Aggregates computed when a session ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub samples: usize,
    pub duration_secs: i64,
    pub avg_memory_percent: f64,
    pub max_memory_percent: f64,
    pub avg_cpu_percent: f64,
    pub max_cpu_percent: f64,
    pub max_disk_percent: f64,
    pub min_safety_score: f64,
    pub alert_count: usize,
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub info_alerts: usize,
}

/// A monitoring session, owned by the monitor that created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSession {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub system_metrics: Vec<SystemMetrics>,
    pub development_metrics: Vec<DevelopmentMetrics>,
    pub alerts_triggered: Vec<Alert>,
    pub summary_stats: Option<SummaryStats>,
}

impl MonitoringSession {
    /// Start a new empty session.
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            start_time: Utc::now(),
            end_time: None,
            system_metrics: Vec::new(),
            development_metrics: Vec::new(),
            alerts_triggered: Vec::new(),
            summary_stats: None,
        }
    }
}
