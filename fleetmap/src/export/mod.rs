//! GeoJSON export of fetched positions.
//!
//! Every successful fetch is serialized and written to a single file,
//! overwriting the previous content. Writes are funnelled through one
//! [`ExportWorker`] task so consecutive refresh cycles never interleave.
//!
//! # Example
//!
//! ```ignore
//! use fleetmap::export::{ExportWorker, GeoJsonExporter};
//!
//! let exporter = GeoJsonExporter::new("trucks.geojson");
//! let (worker, queue) = ExportWorker::new(exporter, metrics.clone());
//! tokio::spawn(worker.run(shutdown.clone()));
//!
//! queue.submit(document);
//! ```

mod worker;

pub use worker::{ExportQueue, ExportWorker, DEFAULT_EXPORT_QUEUE_CAPACITY};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::geojson::FeatureCollection;

/// Default export file name.
pub const DEFAULT_EXPORT_FILE: &str = "trucks.geojson";

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Document serialization failed.
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing or replacing the file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes FeatureCollections to a fixed path.
#[derive(Debug, Clone)]
pub struct GeoJsonExporter {
    path: PathBuf,
}

impl GeoJsonExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path the document is staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Serialize and write a document, replacing any previous file.
    pub async fn write(&self, document: &FeatureCollection) -> Result<(), ExportError> {
        let bytes = serde_json::to_vec(document)?;
        let staging = self.staging_path();

        tokio::fs::write(&staging, &bytes)
            .await
            .map_err(|source| ExportError::Write {
                path: staging.clone(),
                source,
            })?;

        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| ExportError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            path = %self.path.display(),
            features = document.len(),
            bytes = bytes.len(),
            "Export written"
        );
        Ok(())
    }
}
