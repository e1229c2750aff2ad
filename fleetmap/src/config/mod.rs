//! Configuration file support.
//!
//! Settings live in an INI file at `~/.fleetmap/config.ini`:
//!
//! ```ini
//! [source]
//! url = http://0.0.0.0/api/
//! path = truckstartingcoordinates/
//! timeout_secs = 30
//!
//! [poll]
//! interval_ms = 2000
//! start_visible = true
//!
//! [export]
//! enabled = true
//! path = /home/user/.fleetmap/trucks.geojson
//!
//! [map]
//! asset = /usr/share/fleetmap/trucks.geojson
//! center_lat = 40.7128
//! center_lon = -74.006
//! zoom = 11
//!
//! [selection]
//! mode = multiple
//!
//! [logging]
//! level = info
//! ```
//!
//! Every key is optional; missing keys keep their defaults. Each key is
//! described by a [`ConfigKey`], which is also what the CLI's
//! `config get/set/list` commands operate on.

mod file;
mod keys;

pub use file::{
    ConfigFile, ExportSettings, LoggingSettings, MapSettings, PollSettings, SelectionSettings,
    SourceSettings,
};
pub use keys::ConfigKey;

use std::path::PathBuf;

use thiserror::Error;

use crate::geo::GeoError;

/// Name of the configuration directory under the home directory.
pub const CONFIG_DIR_NAME: &str = ".fleetmap";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors that can occur while loading, saving or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file at the expected path.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Reading or writing the file failed.
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid INI.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A key holds a value that cannot be used.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The configured map camera is out of range.
    #[error("Invalid map settings: {0}")]
    Geo(#[from] GeoError),
}

/// Directory holding the configuration file, logs and default export.
///
/// Falls back to the working directory when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
