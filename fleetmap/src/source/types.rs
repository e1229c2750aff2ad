//! Position source trait and error types.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::store::PositionRecord;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors that can occur while fetching positions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Network failure: unreachable host, connection reset, timeout, non-2xx.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body could not be understood.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The source was misconfigured (bad URL, client construction failed).
    #[error("Source configuration error: {0}")]
    Config(String),
}

impl SourceError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Http(_) => "network",
            SourceError::Malformed(_) => "malformed",
            SourceError::Config(_) => "config",
        }
    }
}

/// Something that can report the current set of vehicle positions.
///
/// Implementations must be `Send + Sync` because each fetch runs on its own
/// task while the session keeps the source behind an `Arc`.
pub trait PositionSource: Send + Sync {
    /// Fetch the full current set of positions.
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<PositionRecord>, SourceError>>;

    /// Human-readable description (usually the endpoint URL).
    fn describe(&self) -> String;
}
