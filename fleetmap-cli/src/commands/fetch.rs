//! Fetch command - one-shot request against the position feed.

use std::path::PathBuf;

use clap::Args;
use console::style;

use fleetmap::export::GeoJsonExporter;
use fleetmap::geojson;
use fleetmap::source::PositionSource;
use fleetmap::store::PositionRecord;

use super::common::{build_runtime, build_source, SourceArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also write the positions as GeoJSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("fetch");

    let source = build_source(&args.source, runner.config())?;
    let runtime = build_runtime()?;

    println!("Fetching {}", style(source.url()).cyan());
    let records = runtime.block_on(source.fetch())?;

    println!();
    print_records(&records);

    if let Some(path) = args.output {
        let exporter = GeoJsonExporter::new(&path);
        runtime.block_on(exporter.write(&geojson::from_records(&records)))?;
        println!();
        println!("Wrote {} features to {}", records.len(), path.display());
    }

    Ok(())
}

fn print_records(records: &[PositionRecord]) {
    if records.is_empty() {
        println!("No positions reported.");
        return;
    }

    println!(
        "{}",
        style(format!("{:<20} {:>11} {:>12}", "ID", "LAT", "LON")).bold()
    );
    for record in records {
        println!(
            "{:<20} {:>11.6} {:>12.6}",
            record.id, record.position.lat, record.position.lon
        );
    }
    println!();
    println!("{} positions", records.len());
}
