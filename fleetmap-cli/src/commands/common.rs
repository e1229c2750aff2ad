//! Common types and utilities shared across CLI commands.

use clap::Args;
use fleetmap::config::ConfigFile;
use fleetmap::source::{HttpPositionSource, ReqwestClient};

use crate::error::CliError;

/// Position feed overrides shared by `fetch` and `run`.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Base URL of the tracking API (overrides source.url)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Endpoint path relative to the base URL (overrides source.path)
    #[arg(long, value_name = "PATH")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds (overrides source.timeout_secs)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Feed settings after applying CLI overrides to the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub url: String,
    pub path: String,
    pub timeout_secs: u64,
}

impl SourceArgs {
    /// CLI takes precedence, then config.
    pub fn resolve(&self, config: &ConfigFile) -> ResolvedSource {
        ResolvedSource {
            url: self.url.clone().unwrap_or_else(|| config.source.url.clone()),
            path: self
                .endpoint
                .clone()
                .unwrap_or_else(|| config.source.path.clone()),
            timeout_secs: self
                .timeout
                .unwrap_or(config.source.timeout_secs)
                .max(1),
        }
    }
}

/// Build the reqwest-backed position source.
pub fn build_source(
    args: &SourceArgs,
    config: &ConfigFile,
) -> Result<HttpPositionSource<ReqwestClient>, CliError> {
    let resolved = args.resolve(config);
    Ok(HttpPositionSource::reqwest(
        &resolved.url,
        &resolved.path,
        resolved.timeout_secs,
    )?)
}

/// Multi-threaded runtime for commands that do network I/O.
pub fn build_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("fleetmap")
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))
}
