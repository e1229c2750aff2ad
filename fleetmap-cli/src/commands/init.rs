//! Init command - initialize configuration file.

use std::path::Path;

use fleetmap::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let created = init_at(&path)?;

    if created {
        println!("Created configuration file: {}", path.display());
    } else {
        println!("Configuration file: {}", path.display());
        println!("Existing settings kept; missing keys filled with defaults.");
    }
    println!();
    println!("Edit this file or use 'fleetmap config set' to point at your position feed.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

/// Write the configuration at `path`, keeping any existing values.
///
/// Returns `true` if the file did not exist before.
fn init_at(path: &Path) -> Result<bool, CliError> {
    let existed = path.exists();
    let config = if existed {
        ConfigFile::load_from(path)?
    } else {
        ConfigFile::default()
    };
    config.save_to(path)?;
    Ok(!existed)
}
