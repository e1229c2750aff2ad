//! Session telemetry for observability and user feedback.
//!
//! Lock-free atomic counters record what each refresh cycle did, with
//! minimal overhead on the session task.
//!
//! # Architecture
//!
//! ```text
//! MapSession / ExportWorker ─────► SessionMetrics ─────► MetricsSnapshot ─────► Views
//!                                  (atomic counters)     (point-in-time copy)   (CLI, etc.)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fleetmap::telemetry::SessionMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(SessionMetrics::new());
//! metrics.poll_dispatched();
//! metrics.fetch_succeeded(12);
//!
//! let snapshot = metrics.snapshot();
//! println!("Refreshes: {}", snapshot.fetch_succeeded);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SessionMetrics;
pub use snapshot::MetricsSnapshot;
