//! Session errors.

use thiserror::Error;

use crate::geo::GeoError;

/// Errors returned by [`SessionHandle`](super::SessionHandle).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session task has stopped and no longer accepts commands.
    #[error("Map session has stopped")]
    Closed,

    /// The session stopped before answering.
    #[error("Map session dropped the reply for {0}")]
    NoReply(&'static str),

    /// A viewport with an out-of-range center, zoom or size.
    #[error("Invalid viewport: {0}")]
    InvalidViewport(#[from] GeoError),
}
