//! Wellmark CLI
//!
//! Command-line shell over the annotation service: list files and events,
//! mark and edit events, export annotated data, and sample charts.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wellmark::{AnnotationService, Config};

#[derive(Parser)]
#[command(name = "wellmark", version, about = "Drilling-log annotation service")]
struct Cli {
    /// Path to a TOML config file (default locations otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog files in chronological order
    Files,
    /// List all recorded events
    Events,
    /// Mark a new event
    Add {
        /// Event kind: overflow or lost
        kind: String,
        start_file: String,
        start_row: u64,
        end_file: String,
        end_row: u64,
    },
    /// Delete an event by id
    Remove { id: String },
    /// Change the kind of an existing event
    SetKind { id: String, kind: String },
    /// Export annotated and filtered copies of every touched file
    Export {
        /// Output directory (configured directory otherwise)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Sample a file for charting and print the series as JSON
    Chart {
        /// File to sample; omit together with --all to sample everything
        file: Option<String>,
        /// Sample every catalog file on a worker pool
        #[arg(long)]
        all: bool,
        /// Override the configured sample budget
        #[arg(long)]
        points: Option<usize>,
        /// Override the configured chunk size
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Print a default config file to stdout
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::InitConfig) {
        print!("{}", wellmark::config::generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config);

    tracing::info!("Wellmark v{}", env!("CARGO_PKG_VERSION"));

    let service = AnnotationService::new(config).context("failed to start annotation service")?;

    match cli.command {
        Command::Files => {
            for file in service.list_files() {
                println!(
                    "{}  {} rows  charts/{}",
                    file.name, file.row_count, file.chart_reference
                );
            }
        }
        Command::Events => {
            for event in service.list_events()? {
                println!(
                    "{}  {:<8}  {}:{} -> {}:{}",
                    event.id,
                    event.kind.to_string(),
                    event.start_file,
                    event.start_row,
                    event.end_file,
                    event.end_row
                );
            }
        }
        Command::Add {
            kind,
            start_file,
            start_row,
            end_file,
            end_row,
        } => {
            let event = service.add_event(&kind, &start_file, start_row, &end_file, end_row)?;
            println!("added {} ({})", event.id, event.kind);
        }
        Command::Remove { id } => {
            service.delete_event(&id)?;
            println!("removed {}", id);
        }
        Command::SetKind { id, kind } => {
            let event = service.update_event_kind(&id, &kind)?;
            println!("updated {} to {}", event.id, event.kind);
        }
        Command::Export { output } => {
            let written = service.export(output.as_deref())?;
            for path in &written {
                println!("{}", path.display());
            }
            println!("exported {} files", written.len());
        }
        Command::Chart {
            file,
            all,
            points,
            chunk_size,
        } => {
            if all {
                for (name, result) in service.sample_all() {
                    match result {
                        Ok(sample) => println!(
                            "{}: sampled {} of {} rows",
                            name,
                            sample.points.len(),
                            sample.total_rows
                        ),
                        Err(err) => eprintln!("{}: {}", name, err),
                    }
                }
            } else if let Some(file) = file {
                let sample = service.sample_chart(&file, points, chunk_size)?;
                serde_json::to_writer_pretty(std::io::stdout().lock(), &sample)?;
                println!();
            } else {
                bail!("specify a file to sample, or --all for the whole catalog");
            }
        }
        Command::InitConfig => unreachable!(),
    }

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("wellmark={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
