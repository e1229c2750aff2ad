//! Background export worker.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::GeoJsonExporter;
use crate::geojson::FeatureCollection;
use crate::telemetry::SessionMetrics;

/// Default number of documents that may wait for the writer.
pub const DEFAULT_EXPORT_QUEUE_CAPACITY: usize = 2;

/// Sender side of the export worker.
#[derive(Debug, Clone)]
pub struct ExportQueue {
    tx: mpsc::Sender<FeatureCollection>,
    metrics: Arc<SessionMetrics>,
}

impl ExportQueue {
    /// Queue a document without waiting.
    ///
    /// Returns `false` when the queue is full or the worker has stopped; the
    /// document is dropped and the next refresh supersedes it.
    pub fn submit(&self, document: FeatureCollection) -> bool {
        match self.tx.try_send(document) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Export queue full, dropping document");
                self.metrics.export_dropped();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Export worker stopped, dropping document");
                self.metrics.export_dropped();
                false
            }
        }
    }
}

/// Writes queued documents one at a time.
pub struct ExportWorker {
    exporter: GeoJsonExporter,
    rx: mpsc::Receiver<FeatureCollection>,
    metrics: Arc<SessionMetrics>,
}

impl ExportWorker {
    /// Creates a worker with the default queue capacity.
    pub fn new(exporter: GeoJsonExporter, metrics: Arc<SessionMetrics>) -> (Self, ExportQueue) {
        Self::with_capacity(exporter, metrics, DEFAULT_EXPORT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        exporter: GeoJsonExporter,
        metrics: Arc<SessionMetrics>,
        capacity: usize,
    ) -> (Self, ExportQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let queue = ExportQueue {
            tx,
            metrics: Arc::clone(&metrics),
        };
        let worker = Self {
            exporter,
            rx,
            metrics,
        };
        (worker, queue)
    }

    /// Runs until shutdown is signalled or every queue handle is dropped.
    ///
    /// Write failures are logged and counted; they never stop the worker.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(path = %self.exporter.path().display(), "Export worker starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                document = self.rx.recv() => {
                    let Some(document) = document else { break };
                    match self.exporter.write(&document).await {
                        Ok(()) => self.metrics.export_written(),
                        Err(e) => {
                            warn!(error = %e, "Export failed");
                            self.metrics.export_failed();
                        }
                    }
                }
            }
        }

        info!("Export worker stopped");
    }
}
