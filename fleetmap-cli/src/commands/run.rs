//! Run command - track positions continuously.
//!
//! Starts a map session against the configured feed and reads commands
//! from stdin to simulate taps and visibility changes:
//!
//! ```text
//! tap <x> <y>          tap a screen point
//! tap-at <lat> <lon>   tap where a coordinate is drawn
//! hide | show          pause or resume polling
//! list                 print markers with their screen positions
//! stats                print session counters
//! quit                 stop the session
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use fleetmap::export::{ExportError, ExportWorker, GeoJsonExporter};
use fleetmap::geo::{LatLon, ScreenPoint};
use fleetmap::selection::{SelectionMode, TapOutcome};
use fleetmap::session::{MapSession, SessionConfig, SessionHandle};
use fleetmap::source::{HttpPositionSource, ReqwestClient};
use fleetmap::telemetry::MetricsSnapshot;

use super::common::{build_runtime, build_source, SourceArgs};
use crate::error::CliError;
use crate::renderer::ConsoleRenderer;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Refresh interval in milliseconds (overrides poll.interval_ms)
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// GeoJSON snapshot drawn before the first fetch (overrides map.asset)
    #[arg(long, value_name = "FILE")]
    pub asset: Option<PathBuf>,

    /// Export file (overrides export.path)
    #[arg(long, value_name = "FILE")]
    pub export_path: Option<PathBuf>,

    /// Do not write GeoJSON exports
    #[arg(long)]
    pub no_export: bool,

    /// Allow only one selected marker at a time
    #[arg(long)]
    pub single: bool,

    /// Start with polling paused
    #[arg(long)]
    pub hidden: bool,

    /// Only print frames caused by taps
    #[arg(short, long)]
    pub quiet: bool,

    /// Mirror log output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("run");
    let config = runner.config();

    let source = build_source(&args.source, config)?;

    let mut session_config = config.session_config()?;
    if let Some(ms) = args.interval_ms {
        session_config = session_config.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(asset) = &args.asset {
        session_config = session_config.with_snapshot_path(asset);
    }
    if args.single {
        session_config = session_config.with_selection_mode(SelectionMode::Single);
    }
    if args.hidden {
        session_config = session_config.with_start_visible(false);
    }

    let export_path = (!args.no_export && config.export.enabled).then(|| {
        args.export_path
            .clone()
            .unwrap_or_else(|| config.export.path.clone())
    });

    print_banner(&source, &session_config, export_path.as_ref());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = build_runtime()?;
    let summary = runtime.block_on(run_session(
        source,
        session_config,
        export_path,
        args.quiet,
        shutdown,
    ))?;

    print_summary(&summary);
    Ok(())
}

fn print_banner(
    source: &HttpPositionSource<ReqwestClient>,
    config: &SessionConfig,
    export_path: Option<&PathBuf>,
) {
    println!("{}", style("FleetMap").bold().cyan());
    println!();
    println!("  Feed:      {}", source.url());
    println!("  Interval:  {} ms", config.poll_interval.as_millis());
    println!("  Selection: {}", config.selection_mode);
    match export_path {
        Some(path) => println!("  Export:    {}", path.display()),
        None => println!("  Export:    disabled"),
    }
    if let Some(asset) = &config.snapshot_path {
        println!("  Snapshot:  {}", asset.display());
    }
    println!();
    println!("Type 'help' for commands. Press Ctrl+C to stop.");
    println!();
}

async fn run_session(
    source: HttpPositionSource<ReqwestClient>,
    config: SessionConfig,
    export_path: Option<PathBuf>,
    quiet: bool,
    shutdown: CancellationToken,
) -> Result<MetricsSnapshot, CliError> {
    let (mut session, handle) =
        MapSession::new(config, Arc::new(source), ConsoleRenderer::new(quiet));

    let mut worker_task = None;
    if let Some(path) = export_path {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ExportError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let (worker, queue) = ExportWorker::new(GeoJsonExporter::new(path), session.metrics());
        session = session.with_export(queue);
        worker_task = Some(tokio::spawn(worker.run(shutdown.clone())));
    }

    let session_task = tokio::spawn(session.run(shutdown.clone()));

    read_commands(&handle, &shutdown).await;
    shutdown.cancel();

    session_task
        .await
        .map_err(|e| CliError::Runtime(format!("Session task failed: {}", e)))?;
    if let Some(task) = worker_task {
        let _ = task.await;
    }

    Ok(handle.metrics())
}

/// A line typed at the console.
#[derive(Debug, Clone, PartialEq)]
enum ConsoleCommand {
    Tap(ScreenPoint),
    TapAt(LatLon),
    Show,
    Hide,
    List,
    Stats,
    Help,
    Quit,
}

/// Parse one console line; blank lines yield `None`.
fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let pair = |usage: &str| -> Result<(f64, f64), String> {
        match args.as_slice() {
            [a, b] => {
                let a = a.parse::<f64>().map_err(|_| format!("usage: {}", usage))?;
                let b = b.parse::<f64>().map_err(|_| format!("usage: {}", usage))?;
                Ok((a, b))
            }
            _ => Err(format!("usage: {}", usage)),
        }
    };

    let command = match verb.to_lowercase().as_str() {
        "tap" => {
            let (x, y) = pair("tap <x> <y>")?;
            ConsoleCommand::Tap(ScreenPoint::new(x, y))
        }
        "tap-at" => {
            let (lat, lon) = pair("tap-at <lat> <lon>")?;
            let position = LatLon::try_new(lat, lon).map_err(|e| e.to_string())?;
            ConsoleCommand::TapAt(position)
        }
        "show" => ConsoleCommand::Show,
        "hide" => ConsoleCommand::Hide,
        "list" | "ls" => ConsoleCommand::List,
        "stats" => ConsoleCommand::Stats,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{}', type 'help'", other)),
    };
    Ok(Some(command))
}

/// Read stdin on a dedicated thread and forward lines.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Process console commands until `quit`, Ctrl+C, or the session stops.
///
/// When stdin closes the session keeps running until Ctrl+C.
async fn read_commands(handle: &SessionHandle, shutdown: &CancellationToken) {
    let mut lines = spawn_stdin_reader();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return,
            line = lines.recv() => line,
        };

        let Some(line) = line else {
            shutdown.cancelled().await;
            return;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", style(message).red());
                continue;
            }
        };

        if command == ConsoleCommand::Quit {
            return;
        }

        if let Err(e) = execute(handle, command).await {
            warn!(error = %e, "Session no longer accepting commands");
            return;
        }
    }
}

async fn execute(handle: &SessionHandle, command: ConsoleCommand) -> Result<(), CliError> {
    match command {
        ConsoleCommand::Tap(point) => print_tap(handle.tap(point).await?, point),
        ConsoleCommand::TapAt(position) => print_tap(handle.tap_at(position).await?, position),
        ConsoleCommand::Show => {
            handle.show().await?;
            println!("Polling resumed");
        }
        ConsoleCommand::Hide => {
            handle.hide().await?;
            println!("Polling paused");
        }
        ConsoleCommand::List => {
            let snapshot = handle.snapshot().await?;
            if snapshot.entities.is_empty() {
                println!("No markers.");
            }
            for entity in &snapshot.entities {
                let screen = snapshot.viewport.project(entity.position);
                let mark = if entity.selected {
                    style("●").yellow()
                } else {
                    style("○").dim()
                };
                println!(
                    "{} {:<20} {:<24} screen {}",
                    mark,
                    entity.label(),
                    entity.position.to_string(),
                    screen
                );
            }
        }
        ConsoleCommand::Stats => print_stats(&handle.metrics()),
        ConsoleCommand::Help => print_help(),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn print_tap(outcome: TapOutcome, at: impl std::fmt::Display) {
    match outcome {
        TapOutcome::Hit { id, selected: true } => println!("{} {} selected", style("●").yellow(), id),
        TapOutcome::Hit { id, selected: false } => println!("{} {} deselected", style("○").dim(), id),
        TapOutcome::Miss => println!("No marker at {}", at),
    }
}

fn print_help() {
    println!("  tap <x> <y>          tap a screen point");
    println!("  tap-at <lat> <lon>   tap where a coordinate is drawn");
    println!("  hide | show          pause or resume polling");
    println!("  list                 print markers with their screen positions");
    println!("  stats                print session counters");
    println!("  quit                 stop the session");
}

fn print_stats(snapshot: &MetricsSnapshot) {
    println!(
        "[{}] {} markers | fetches {} ok / {} failed ({:.0}%) | skipped ticks {} | last refresh {}",
        snapshot.uptime_human(),
        snapshot.entities,
        snapshot.fetch_succeeded,
        snapshot.fetch_failed,
        snapshot.success_rate() * 100.0,
        snapshot.polls_skipped,
        snapshot.last_refresh_human()
    );
}

fn print_summary(snapshot: &MetricsSnapshot) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Fetches:  {} ok, {} failed, {} discarded",
        snapshot.fetch_succeeded, snapshot.fetch_failed, snapshot.results_discarded
    );
    println!(
        "  Taps:     {} hit, {} missed",
        snapshot.taps_hit, snapshot.taps_missed
    );
    println!(
        "  Exports:  {} written, {} failed, {} dropped",
        snapshot.exports_written, snapshot.exports_failed, snapshot.exports_dropped
    );
    println!("  Redraws:  {}", snapshot.redraws);
    println!("  Uptime:   {}", snapshot.uptime_human());
}
