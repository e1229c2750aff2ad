//! `fleetmap config` subcommands.
//!
//! `get`, `set`, `list` and `path` edit `config.ini` key by key. `check`
//! goes further and resolves the file the way `fleetmap run` would: it
//! builds the source URL, validates the camera, loads the snapshot asset
//! and looks at the export target, reporting anything that would make a
//! session start empty or fail.

use std::fmt;

use clap::Subcommand;
use console::style;
use fleetmap::config::{config_file_path, ConfigFile, ConfigKey};
use fleetmap::geojson;
use fleetmap::session::MIN_POLL_INTERVAL_MS;
use fleetmap::source::HttpPositionSource;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value
    Get {
        /// Key as section.key (e.g., poll.interval_ms)
        key: String,
    },

    /// Change one value; it is validated before the file is written
    Set {
        /// Key as section.key (e.g., source.url)
        key: String,

        /// New value
        value: String,
    },

    /// List every key, marking values changed from the defaults
    List,

    /// Print the configuration file path
    Path,

    /// Resolve the configuration as `run` would and report problems
    Check,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Check => run_check(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown key '{}'. Run 'fleetmap config list' for the available keys.",
            key
        ))
    })
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let value = config_key.get(&ConfigFile::load_or_default()?);

    if value.is_empty() {
        println!("{}", style("(not set)").dim());
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load_or_default()?;
    config_key.set(&mut config, value)?;
    config.save()?;

    println!("{} = {}", config_key.name(), style(config_key.get(&config)).cyan());

    if config_key == ConfigKey::PollIntervalMs && config.poll.interval_ms < MIN_POLL_INTERVAL_MS {
        println!(
            "{} intervals below {} ms are raised to {} ms when the session starts",
            style("note:").yellow(),
            MIN_POLL_INTERVAL_MS,
            MIN_POLL_INTERVAL_MS
        );
    }
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load_or_default()?;
    let defaults = ConfigFile::default();

    println!("{}", style(config_file_path().display()).dim());

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            println!();
            println!("{}", style(format!("[{}]", section)).bold());
            current_section = section;
        }

        let value = key.get(&config);
        let shown = if value.is_empty() {
            style("(not set)".to_string()).dim()
        } else {
            style(value.clone())
        };

        if value != key.get(&defaults) {
            println!("  {} = {} {}", key.key_name(), shown, style("*").yellow());
        } else {
            println!("  {} = {}", key.key_name(), shown);
        }
    }

    println!();
    println!("{} changed from the default", style("*").yellow());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

fn run_check() -> Result<(), CliError> {
    let config = ConfigFile::load_or_default()?;
    let findings = check(&config);

    for finding in &findings {
        println!("{}", finding);
    }

    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    if errors > 0 {
        return Err(CliError::Config(format!(
            "{} problem(s) in {}",
            errors,
            config_file_path().display()
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Ok,
    Warn,
    Error,
}

#[derive(Debug)]
struct Finding {
    severity: Severity,
    section: &'static str,
    message: String,
}

impl Finding {
    fn new(severity: Severity, section: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            section,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Ok => style("  ok ").green(),
            Severity::Warn => style(" warn").yellow(),
            Severity::Error => style("error").red().bold(),
        };
        write!(f, "{} {:<10} {}", label, self.section, self.message)
    }
}

/// Resolve each section the way a session would, one finding per concern.
fn check(config: &ConfigFile) -> Vec<Finding> {
    let mut findings = Vec::new();

    match HttpPositionSource::reqwest(
        &config.source.url,
        &config.source.path,
        config.source.timeout_secs,
    ) {
        Ok(source) => findings.push(Finding::new(
            Severity::Ok,
            "source",
            format!("GET {} (timeout {}s)", source.url(), config.source.timeout_secs),
        )),
        Err(e) => findings.push(Finding::new(Severity::Error, "source", e.to_string())),
    }

    if config.poll.interval_ms < MIN_POLL_INTERVAL_MS {
        findings.push(Finding::new(
            Severity::Warn,
            "poll",
            format!(
                "interval {} ms is below the {} ms floor and will be raised",
                config.poll.interval_ms, MIN_POLL_INTERVAL_MS
            ),
        ));
    } else {
        findings.push(Finding::new(
            Severity::Ok,
            "poll",
            format!("every {} ms", config.poll.interval_ms),
        ));
    }

    match config.viewport() {
        Ok(viewport) => findings.push(Finding::new(
            Severity::Ok,
            "map",
            format!(
                "camera {} zoom {} ({}x{})",
                viewport.center, viewport.zoom, viewport.width, viewport.height
            ),
        )),
        Err(e) => findings.push(Finding::new(Severity::Error, "map", e.to_string())),
    }

    match &config.map.asset {
        None => findings.push(Finding::new(
            Severity::Ok,
            "map",
            "no snapshot asset, the map starts empty",
        )),
        Some(asset) => match geojson::load_snapshot(asset) {
            Ok(store) => findings.push(Finding::new(
                Severity::Ok,
                "map",
                format!("snapshot {} ({} markers)", asset.display(), store.len()),
            )),
            Err(e) => findings.push(Finding::new(
                Severity::Warn,
                "map",
                format!("{}; the map will start empty", e),
            )),
        },
    }

    if !config.export.enabled {
        findings.push(Finding::new(Severity::Ok, "export", "disabled"));
    } else {
        let path = &config.export.path;
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                findings.push(Finding::new(
                    Severity::Warn,
                    "export",
                    format!("{} does not exist yet and will be created", dir.display()),
                ))
            }
            _ => findings.push(Finding::new(
                Severity::Ok,
                "export",
                format!("writes {}", path.display()),
            )),
        }
    }

    findings
}
