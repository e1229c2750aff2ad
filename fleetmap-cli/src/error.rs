//! CLI error type.

use std::fmt;

use fleetmap::config::ConfigError;
use fleetmap::export::ExportError;
use fleetmap::logging::LoggingError;
use fleetmap::session::SessionError;
use fleetmap::source::SourceError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing configuration, including CLI overrides.
    Config(String),
    /// The position feed could not be reached or understood.
    Source(SourceError),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// Writing GeoJSON failed.
    Export(ExportError),
    /// The async runtime or session failed.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Source(e) => write!(f, "Position feed error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Export(e) => write!(f, "Export error: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Source(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Export(e) => Some(e),
            CliError::Config(_) | CliError::Runtime(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        CliError::Export(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Runtime(e.to_string())
    }
}
