//! mtevent CLI - Build measurement tracker events from geometry and event files.
//!
#![allow(
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};

use mtevent_builder::{MeasurementTrackerEventProducer, Published, SnapshotSummary};
use mtevent_config::{Era, ProcessConfig};
use mtevent_core::{EventSource, ModuleKind, RegistryCatalog};
use mtevent_io::{load_events, load_geometry, EventData};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] mtevent_io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] mtevent_config::Error),

    #[error("Core error: {0}")]
    Core(#[from] mtevent_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} events failed")]
    EventsFailed { failed: usize, total: usize },
}

/// Data-taking era.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EraArg {
    /// Run 2 detector (default)
    Run2,
    /// Phase-1 pixel detector
    Phase1Pixel,
    /// Phase-2 tracker
    Phase2Tracker,
}

impl From<EraArg> for Era {
    fn from(arg: EraArg) -> Self {
        match arg {
            EraArg::Run2 => Era::Run2,
            EraArg::Phase1Pixel => Era::Phase1Pixel,
            EraArg::Phase2Tracker => Era::Phase2Tracker,
        }
    }
}

/// Per-event measurement tracker event builder.
#[derive(Parser)]
#[command(name = "mtevent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build measurement tracker events for every event in a file
    Process {
        /// Geometry JSON file
        #[arg(short, long)]
        geometry: PathBuf,

        /// Event JSON file
        #[arg(short, long)]
        events: PathBuf,

        /// Producer configuration JSON file (standard instances if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Era override
        #[arg(long, value_enum)]
        era: Option<EraArg>,

        /// Run only these instances (repeatable)
        #[arg(short, long)]
        instance: Vec<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved producer instances as JSON
    Config {
        /// Producer configuration JSON file (standard instances if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Era override
        #[arg(long, value_enum)]
        era: Option<EraArg>,
    },

    /// Show the module registries of a geometry file
    Geometry {
        /// Geometry JSON file
        geometry: PathBuf,
    },
}

fn load_config(path: Option<&Path>, era: Option<EraArg>) -> Result<ProcessConfig> {
    let config = match (path, era) {
        (Some(path), Some(era)) => ProcessConfig::from_file_with_era(path, era.into())?,
        (Some(path), None) => ProcessConfig::from_file(path)?,
        (None, era) => ProcessConfig::standard(era.map_or_else(Era::default, Era::from)),
    };
    Ok(config)
}

fn build_producers(
    config: &ProcessConfig,
    catalog: &RegistryCatalog,
) -> Result<Vec<MeasurementTrackerEventProducer>> {
    config
        .instances()
        .iter()
        .map(|named| {
            MeasurementTrackerEventProducer::new(named.name.clone(), &named.config, catalog)
                .map_err(CliError::from)
        })
        .collect()
}

/// Runs every producer on one event and returns the per-instance summaries.
fn process_event(
    event: &EventData,
    producers: &[MeasurementTrackerEventProducer],
) -> mtevent_core::Result<Vec<SnapshotSummary>> {
    let mut published = Published::new();
    for producer in producers {
        producer.produce_into(event, &mut published)?;
    }
    Ok(producers
        .iter()
        .filter_map(|producer| published.get(producer.name()))
        .map(|snapshot| snapshot.summary())
        .collect())
}

fn print_summary(
    producers: &[MeasurementTrackerEventProducer],
    totals: &[SnapshotSummary],
    events: usize,
    json: bool,
) -> Result<()> {
    if json {
        let instances: Vec<serde_json::Value> = producers
            .iter()
            .zip(totals)
            .map(|(producer, total)| {
                let kinds: serde_json::Map<String, serde_json::Value> = ModuleKind::ALL
                    .iter()
                    .map(|kind| {
                        let k = total.kind(*kind);
                        (
                            kind.name().to_string(),
                            serde_json::json!({
                                "modules": k.modules,
                                "inactive": k.inactive,
                                "empty": k.empty,
                                "measurements": k.measurements,
                            }),
                        )
                    })
                    .collect();
                serde_json::json!({
                    "name": producer.name(),
                    "events": events,
                    "kinds": kinds,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    for (producer, total) in producers.iter().zip(totals) {
        println!("{} ({} events): {}", producer.name(), events, total);
        for kind in ModuleKind::ALL {
            let k = total.kind(kind);
            if k.modules > 0 {
                println!(
                    "  {:<13} {:>8} module entries, {:>8} inactive, {:>10} measurements",
                    kind.name(),
                    k.modules,
                    k.inactive,
                    k.measurements
                );
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Process {
            geometry,
            events,
            config,
            era,
            instance,
            json,
        } => {
            let start = Instant::now();
            let catalog = load_geometry(&geometry)?;
            let mut config = load_config(config.as_deref(), era)?;
            if !instance.is_empty() {
                config = config.select(&instance)?;
            }
            let producers = build_producers(&config, &catalog)?;
            let events = load_events(&events)?;

            log::info!(
                "processing {} events with {} instance(s), era {}",
                events.len(),
                producers.len(),
                config.era()
            );

            let results: Vec<mtevent_core::Result<Vec<SnapshotSummary>>> = events
                .par_iter()
                .map(|event| process_event(event, &producers))
                .collect();

            let mut totals = vec![SnapshotSummary::default(); producers.len()];
            let mut failed = 0usize;
            for (event, result) in events.iter().zip(&results) {
                match result {
                    Ok(summaries) => {
                        for (total, summary) in totals.iter_mut().zip(summaries) {
                            total.add(summary);
                        }
                    }
                    Err(e) => {
                        log::error!("event {}: {}", event.event_id(), e);
                        failed += 1;
                    }
                }
            }

            print_summary(&producers, &totals, events.len() - failed, json)?;
            log::info!("done in {:.2?}", start.elapsed());

            if failed > 0 {
                return Err(CliError::EventsFailed {
                    failed,
                    total: events.len(),
                });
            }
        }

        Commands::Config { config, era } => {
            let config = load_config(config.as_deref(), era)?;
            // Validate every instance before printing
            for named in config.instances() {
                mtevent_config::resolve(&named.config)?;
            }
            println!("{}", serde_json::to_string_pretty(config.instances())?);
        }

        Commands::Geometry { geometry } => {
            let catalog = load_geometry(&geometry)?;
            for (name, registry) in catalog.iter() {
                let label = if name.is_empty() { "(default)" } else { name };
                println!("{}: {} modules", label, registry.len());
                for kind in ModuleKind::ALL {
                    let count = registry.count_of(kind);
                    if count > 0 {
                        let bad = registry
                            .modules_of_kind(kind)
                            .filter(|(_, info)| info.bad)
                            .count();
                        println!("  {:<13} {:>8} ({} bad)", kind.name(), count, bad);
                    }
                }
            }
        }
    }

    Ok(())
}
