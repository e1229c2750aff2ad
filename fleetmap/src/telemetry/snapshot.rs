//! Point-in-time copy of session metrics.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Immutable view of [`SessionMetrics`](super::SessionMetrics) for display.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub polls_dispatched: u64,
    pub polls_skipped: u64,
    pub fetch_succeeded: u64,
    pub fetch_failed: u64,
    pub results_discarded: u64,
    pub redraws: u64,
    pub taps_hit: u64,
    pub taps_missed: u64,
    pub exports_written: u64,
    pub exports_failed: u64,
    pub exports_dropped: u64,
    /// Entities in the store after the last refresh.
    pub entities: u64,
    /// Local time of the last successful refresh.
    pub last_refresh: Option<DateTime<Local>>,
}

impl MetricsSnapshot {
    /// Fraction of completed fetches that succeeded (1.0 when none ran).
    pub fn success_rate(&self) -> f64 {
        let total = self.fetch_succeeded + self.fetch_failed;
        if total == 0 {
            1.0
        } else {
            self.fetch_succeeded as f64 / total as f64
        }
    }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    /// Last refresh as `HH:MM:SS`, or `never`.
    pub fn last_refresh_human(&self) -> String {
        self.last_refresh
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    }
}
