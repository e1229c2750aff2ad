//! Shared command setup: configuration and logging.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use fleetmap::config::{config_file_path, ConfigFile};
use fleetmap::logging::init_logging;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for one command.
///
/// Keep the runner alive until the command finishes so buffered log lines
/// are flushed.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: WorkerGuard,
}

impl CliRunner {
    /// Load the configuration (defaults if absent) and start logging.
    ///
    /// With `verbose`, log lines are mirrored to stderr.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load_or_default()?;
        let guard = init_logging(&config.logging_config().with_stderr(verbose))?;
        Ok(Self {
            config,
            _log_guard: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = fleetmap::VERSION,
            command,
            config = %config_file_path().display(),
            log = %self.config.logging_config().file_path().display(),
            "FleetMap starting"
        );
    }
}
