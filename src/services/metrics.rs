//! Host and development-environment metrics.
//!
//! [`ProcCollector`] reads `/proc` for memory, CPU, processes and load, and
//! runs `df` for disk usage. Development metrics come from the uncommitted
//! diff of the watched repository.

use crate::core::abstraction::AbstractionEngine;
use crate::models::monitor::{DevelopmentMetrics, SystemMetrics};
use crate::services::git::Vcs;
use crate::Result;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of monitoring samples.
pub trait MetricsCollector: Send {
    fn system_metrics(&mut self) -> Result<SystemMetrics>;

    fn development_metrics(&mut self) -> Result<DevelopmentMetrics>;
}

/// Cumulative CPU counters from the first line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Linux collector backed by `/proc` and `df`.
pub struct ProcCollector {
    proc_root: PathBuf,
    disk_path: PathBuf,
    repo: Option<Box<dyn Vcs>>,
    engine: AbstractionEngine,
    last_cpu: Option<CpuTimes>,
}

impl ProcCollector {
    /// Collector for the host, measuring disk usage of `disk_path`.
    pub fn new(disk_path: &Path) -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            disk_path: disk_path.to_path_buf(),
            repo: None,
            engine: AbstractionEngine::default(),
            last_cpu: None,
        }
    }

    /// Read from a different proc root (used by tests).
    pub fn with_proc_root(mut self, proc_root: &Path) -> Self {
        self.proc_root = proc_root.to_path_buf();
        self
    }

    /// Watch a repository for development metrics.
    pub fn with_repo(mut self, repo: Box<dyn Vcs>, engine: AbstractionEngine) -> Self {
        self.repo = Some(repo);
        self.engine = engine;
        self
    }

    fn read_proc(&self, name: &str) -> Result<String> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path)
            .map_err(|e| crate::Error::Metrics(format!("cannot read {}: {}", path.display(), e)))
    }

    fn cpu_percent(&mut self) -> Result<f64> {
        let current = parse_cpu_times(&self.read_proc("stat")?)
            .ok_or_else(|| crate::Error::Metrics("unexpected /proc/stat format".to_string()))?;

        // The first sample has no previous reading and reports 0
        let percent = match self.last_cpu {
            Some(previous) => cpu_usage_between(previous, current),
            None => 0.0,
        };
        self.last_cpu = Some(current);
        Ok(percent)
    }

    fn process_count(&self) -> Result<u32> {
        let entries = fs::read_dir(&self.proc_root)?;
        let count = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn disk_percent(&self) -> Result<f64> {
        let output = Command::new("df")
            .arg("-Pk")
            .arg(&self.disk_path)
            .output()
            .map_err(|e| crate::Error::Metrics(format!("cannot run df: {}", e)))?;
        if !output.status.success() {
            return Err(crate::Error::Metrics(format!(
                "df failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_df_percent(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| crate::Error::Metrics("unexpected df output".to_string()))
    }
}

impl MetricsCollector for ProcCollector {
    fn system_metrics(&mut self) -> Result<SystemMetrics> {
        let memory_percent = parse_meminfo_percent(&self.read_proc("meminfo")?)
            .ok_or_else(|| crate::Error::Metrics("unexpected /proc/meminfo format".to_string()))?;
        let cpu_percent = self.cpu_percent()?;
        let process_count = self.process_count()?;
        let load_average = self
            .read_proc("loadavg")
            .ok()
            .and_then(|s| parse_loadavg(&s));

        // Disk usage is best-effort; containers often lack df
        let disk_percent = self.disk_percent().unwrap_or_else(|e| {
            tracing::debug!("Disk usage unavailable: {}", e);
            0.0
        });

        Ok(SystemMetrics {
            timestamp: Utc::now(),
            memory_percent,
            cpu_percent,
            disk_percent,
            process_count,
            load_average,
        })
    }

    fn development_metrics(&mut self) -> Result<DevelopmentMetrics> {
        let Some(ref repo) = self.repo else {
            return Ok(DevelopmentMetrics {
                timestamp: Utc::now(),
                safety_score: 1.0,
                uncommitted_files: 0,
                sensitive_matches: 0,
            });
        };

        let uncommitted_files = repo.uncommitted_file_count()?;
        let diff = repo.uncommitted_diff()?;
        Ok(development_metrics_from_diff(&self.engine, &diff, uncommitted_files))
    }
}

/// Score an uncommitted diff.
///
/// Only added lines are scanned; removed lines are leaving the tree.
pub fn development_metrics_from_diff(
    engine: &AbstractionEngine,
    diff: &str,
    uncommitted_files: usize,
) -> DevelopmentMetrics {
    let added: Vec<&str> = diff
        .lines()
        .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
        .map(|l| &l[1..])
        .collect();
    let result = engine.process(&added.join("\n"));

    DevelopmentMetrics {
        timestamp: Utc::now(),
        safety_score: result.safety_score,
        uncommitted_files,
        sensitive_matches: result.mappings,
    }
}

/// Memory usage from `/proc/meminfo` as `(total - available) / total`.
pub fn parse_meminfo_percent(meminfo: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;

    for line in meminfo.lines() {
        let mut parts = line.split_whitespace();
        let key = parts.next()?;
        let value: Option<u64> = parts.next().and_then(|v| v.parse().ok());
        match key {
            "MemTotal:" => total = value,
            "MemAvailable:" => available = value,
            _ => {}
        }
    }

    let total = total.filter(|t| *t > 0)? as f64;
    let available = available? as f64;
    Some(((total - available) / total * 100.0).clamp(0.0, 100.0))
}

/// Aggregate CPU counters from `/proc/stat`.
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();
    if values.len() < 4 {
        return None;
    }
    // idle + iowait
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: values.iter().sum(),
    })
}

/// CPU busy percentage between two readings.
pub fn cpu_usage_between(previous: CpuTimes, current: CpuTimes) -> f64 {
    let total = current.total.saturating_sub(previous.total);
    if total == 0 {
        return 0.0;
    }
    let idle = current.idle.saturating_sub(previous.idle);
    (total.saturating_sub(idle) as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Capacity column of `df -P` output.
pub fn parse_df_percent(output: &str) -> Option<f64> {
    let line = output.lines().nth(1)?;
    let capacity = line.split_whitespace().nth(4)?;
    capacity.trim_end_matches('%').parse().ok()
}

/// 1-minute load average from `/proc/loadavg`.
pub fn parse_loadavg(loadavg: &str) -> Option<f64> {
    loadavg.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:       16000000 kB\n\
MemFree:         2000000 kB\n\
MemAvailable:    4000000 kB\n\
Buffers:          100000 kB\n";

    #[test]
    fn test_parse_meminfo() {
        let percent = parse_meminfo_percent(MEMINFO).unwrap();
        assert!((percent - 75.0).abs() < 1e-9);
        assert!(parse_meminfo_percent("MemTotal: 0 kB\nMemAvailable: 0 kB").is_none());
    }

    #[test]
    fn test_cpu_usage() {
        let first = parse_cpu_times("cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 1 2 3 4").unwrap();
        assert_eq!(first, CpuTimes { idle: 800, total: 1000 });
        let second = CpuTimes { idle: 1300, total: 2000 };
        assert!((cpu_usage_between(first, second) - 50.0).abs() < 1e-9);
        assert_eq!(cpu_usage_between(first, first), 0.0);
    }

    #[test]
    fn test_parse_df() {
        let output = "Filesystem 1024-blocks Used Available Capacity Mounted on\n\
/dev/sda1 100000 42000 58000 42% /\n";
        assert_eq!(parse_df_percent(output), Some(42.0));
        assert_eq!(parse_df_percent("header only"), None);
    }

    #[test]
    fn test_parse_loadavg() {
        assert_eq!(parse_loadavg("0.52 0.58 0.59 1/389 12345\n"), Some(0.52));
    }

    #[test]
    fn test_diff_metrics_only_scan_added_lines() {
        let engine = AbstractionEngine::default();
        let diff = "\
--- a/settings.py
+++ b/settings.py
-password = \"old-secret-value\"
+DEBUG = True
";
        let metrics = development_metrics_from_diff(&engine, diff, 1);
        assert_eq!(metrics.safety_score, 1.0);
        assert_eq!(metrics.sensitive_matches, 0);

        let diff = "+API_KEY=\"abcd1234efgh5678\"\n";
        let metrics = development_metrics_from_diff(&engine, diff, 1);
        assert!(metrics.safety_score < 0.8);
        assert!(metrics.sensitive_matches >= 1);
    }

    #[test]
    fn test_fake_proc_root() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("meminfo"), MEMINFO).unwrap();
        fs::write(root.join("stat"), "cpu  1 1 1 1 0 0 0\n").unwrap();
        fs::write(root.join("loadavg"), "1.50 1.00 0.50 2/100 42\n").unwrap();
        for pid in ["1", "42", "1337"] {
            fs::create_dir(root.join(pid)).unwrap();
        }
        fs::create_dir(root.join("self")).unwrap();

        let mut collector = ProcCollector::new(root).with_proc_root(root);
        let metrics = collector.system_metrics().unwrap();
        assert_eq!(metrics.process_count, 3);
        assert_eq!(metrics.cpu_percent, 0.0);
        assert_eq!(metrics.load_average, Some(1.5));
        assert!((metrics.memory_percent - 75.0).abs() < 1e-9);

        let dev = collector.development_metrics().unwrap();
        assert_eq!(dev.safety_score, 1.0);
    }
}
