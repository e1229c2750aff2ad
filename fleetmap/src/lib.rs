//! FleetMap - live vehicle positions on a map
//!
//! This library polls a position feed, keeps the latest positions in an
//! id-keyed store that remembers which markers the user selected, and
//! exports every refresh as GeoJSON.
//!
//! # Modules
//!
//! - [`source`] - fetching and parsing position feeds
//! - [`store`] - the merged, selection-preserving entity store
//! - [`session`] - the poll loop that ties fetch, merge, selection and redraw together
//! - [`selection`] - hit testing and selection toggling
//! - [`export`] - GeoJSON export worker
//! - [`geojson`] - GeoJSON document model
//! - [`geo`] - coordinates and Web Mercator projection
//! - [`render`] - renderer abstraction
//! - [`config`] - INI configuration file
//! - [`telemetry`] - session counters

pub mod config;
pub mod export;
pub mod geo;
pub mod geojson;
pub mod logging;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
pub mod store;
pub mod telemetry;

/// Crate version, for logs and `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
