//! Daemon health reporting.
//!
//! Combines the status pipeline's `health_check()` with daemon uptime and
//! the last poll cycle into a single [`DaemonHealth`] report, which the
//! orchestrator logs whenever the status changes.

use serde::Serialize;

use streamr_monitor_core::pipeline::HealthStatus;
use streamr_monitor_log_pipeline::CycleReport;

/// Health report for the whole daemon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaemonHealth {
    /// Status pipeline health.
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Pipeline lifecycle state (`initialized`, `running`, `stopped`).
    pub pipeline_state: String,
    /// Number of monitored nodes.
    pub nodes: usize,
    /// Summary of the last completed poll cycle.
    pub last_cycle: Option<CycleSummary>,
}

/// Serializable subset of a [`CycleReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    pub read_failures: usize,
    pub entry_errors: usize,
    pub dispatched: usize,
    pub duration_ms: u64,
    pub finished_at: String,
}

impl From<&CycleReport> for CycleSummary {
    fn from(report: &CycleReport) -> Self {
        Self {
            cycle: report.cycle,
            read_failures: report.read_failures,
            entry_errors: report.entry_errors,
            dispatched: report.dispatched,
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            finished_at: report.finished_at.to_rfc3339(),
        }
    }
}

/// Log a health report at a level matching its status.
pub fn log_health(health: &DaemonHealth) {
    let cycle = health.last_cycle.as_ref().map(|c| c.cycle);
    match &health.status {
        HealthStatus::Healthy => tracing::info!(
            uptime_secs = health.uptime_secs,
            nodes = health.nodes,
            cycle = ?cycle,
            "daemon healthy"
        ),
        HealthStatus::Degraded(reason) => tracing::warn!(
            uptime_secs = health.uptime_secs,
            cycle = ?cycle,
            reason = %reason,
            "daemon degraded"
        ),
        HealthStatus::Unhealthy(reason) => tracing::error!(
            uptime_secs = health.uptime_secs,
            cycle = ?cycle,
            reason = %reason,
            "daemon unhealthy"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cycle_summary_from_report() {
        let report = CycleReport {
            cycle: 4,
            nodes: 2,
            read_failures: 1,
            lines: 30,
            entry_errors: 0,
            dispatched: 1,
            duration: Duration::from_millis(125),
            finished_at: chrono::Utc::now(),
        };
        let summary = CycleSummary::from(&report);
        assert_eq!(summary.cycle, 4);
        assert_eq!(summary.read_failures, 1);
        assert_eq!(summary.duration_ms, 125);
    }

    #[test]
    fn test_daemon_health_serializes() {
        let health = DaemonHealth {
            status: HealthStatus::Degraded("cycle 1: 1 read failure(s)".to_owned()),
            uptime_secs: 60,
            pipeline_state: "running".to_owned(),
            nodes: 2,
            last_cycle: None,
        };
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["uptime_secs"], 60);
        assert_eq!(json["pipeline_state"], "running");
        assert!(json["status"]["Degraded"].is_string());
    }
}
