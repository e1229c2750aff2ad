//! Atomic session counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::snapshot::MetricsSnapshot;

/// Counters shared between the session task, the export worker and views.
#[derive(Debug)]
pub struct SessionMetrics {
    started: Instant,
    polls_dispatched: AtomicU64,
    polls_skipped: AtomicU64,
    fetch_succeeded: AtomicU64,
    fetch_failed: AtomicU64,
    results_discarded: AtomicU64,
    redraws: AtomicU64,
    taps_hit: AtomicU64,
    taps_missed: AtomicU64,
    exports_written: AtomicU64,
    exports_failed: AtomicU64,
    exports_dropped: AtomicU64,
    entities: AtomicU64,
    last_refresh: Mutex<Option<DateTime<Local>>>,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            polls_dispatched: AtomicU64::new(0),
            polls_skipped: AtomicU64::new(0),
            fetch_succeeded: AtomicU64::new(0),
            fetch_failed: AtomicU64::new(0),
            results_discarded: AtomicU64::new(0),
            redraws: AtomicU64::new(0),
            taps_hit: AtomicU64::new(0),
            taps_missed: AtomicU64::new(0),
            exports_written: AtomicU64::new(0),
            exports_failed: AtomicU64::new(0),
            exports_dropped: AtomicU64::new(0),
            entities: AtomicU64::new(0),
            last_refresh: Mutex::new(None),
        }
    }

    pub fn poll_dispatched(&self) {
        self.polls_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// A tick fired while a request was still in flight.
    pub fn poll_skipped(&self) {
        self.polls_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch was merged; `entities` is the store size afterwards.
    pub fn fetch_succeeded(&self, entities: usize) {
        self.fetch_succeeded.fetch_add(1, Ordering::Relaxed);
        self.entities.store(entities as u64, Ordering::Relaxed);
        *self.last_refresh.lock() = Some(Local::now());
    }

    pub fn fetch_failed(&self) {
        self.fetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch completed after its session was torn down.
    pub fn result_discarded(&self) {
        self.results_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn redraw(&self) {
        self.redraws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tap(&self, hit: bool) {
        if hit {
            self.taps_hit.fetch_add(1, Ordering::Relaxed);
        } else {
            self.taps_missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn export_written(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn export_failed(&self) {
        self.exports_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// An export was dropped because the queue was full.
    pub fn export_dropped(&self) {
        self.exports_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the store size without counting a refresh (initial seed).
    pub fn set_entities(&self, entities: usize) {
        self.entities.store(entities as u64, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started.elapsed(),
            polls_dispatched: self.polls_dispatched.load(Ordering::Relaxed),
            polls_skipped: self.polls_skipped.load(Ordering::Relaxed),
            fetch_succeeded: self.fetch_succeeded.load(Ordering::Relaxed),
            fetch_failed: self.fetch_failed.load(Ordering::Relaxed),
            results_discarded: self.results_discarded.load(Ordering::Relaxed),
            redraws: self.redraws.load(Ordering::Relaxed),
            taps_hit: self.taps_hit.load(Ordering::Relaxed),
            taps_missed: self.taps_missed.load(Ordering::Relaxed),
            exports_written: self.exports_written.load(Ordering::Relaxed),
            exports_failed: self.exports_failed.load(Ordering::Relaxed),
            exports_dropped: self.exports_dropped.load(Ordering::Relaxed),
            entities: self.entities.load(Ordering::Relaxed),
            last_refresh: *self.last_refresh.lock(),
        }
    }
}
