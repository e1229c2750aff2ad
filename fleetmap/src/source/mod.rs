//! Position source abstraction
//!
//! This module provides the trait the session polls for vehicle positions
//! and its HTTP implementation.
//!
//! ```ignore
//! use fleetmap::source::{HttpPositionSource, PositionSource};
//!
//! let source = HttpPositionSource::reqwest("http://host/api/", "trucks/", 30)?;
//! let records = source.fetch().await?;
//! ```

mod http;
mod parse;
mod types;

pub use http::{
    endpoint_url, AsyncHttpClient, HttpPositionSource, ReqwestClient, DEFAULT_BASE_URL,
    DEFAULT_POSITIONS_PATH, DEFAULT_TIMEOUT_SECS,
};
pub use parse::parse_positions;
pub use types::{BoxFuture, PositionSource, SourceError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
