//! Command-line interface for the ValveSim test-rig simulator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use valvesim_mapping::{emit_to_string, group_entries, read_mapping_file};
use valvesim_server::{AddressSpace, SimConfig, UpdateScheduler};

/// ValveSim - simulated device address space for a valve test rig.
#[derive(Parser, Debug)]
#[command(name = "valvesim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a flat mapping file into the structured form.
    Convert {
        /// Flat mapping file to read.
        #[arg(short, long)]
        input: PathBuf,
        /// Structured output file to write.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the simulation server until Ctrl-C.
    Run {
        /// Config file (JSON). Flags below override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Mapping file to build the address space from.
        #[arg(short, long)]
        mapping: Option<PathBuf>,
        /// Milliseconds between update passes.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// List the entries of a mapping file.
    List {
        /// Mapping file to read.
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match args.command {
        Command::Convert { input, output } => convert(&input, &output),
        Command::Run {
            config,
            mapping,
            interval_ms,
        } => run(config, mapping, interval_ms).await,
        Command::List { mapping } => list(&mapping),
    }
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let doc = read_mapping_file(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    let total = doc.entries.len();

    let report = group_entries(doc.entries);
    let structured = emit_to_string(&doc.namespace_uris, &report.grouped);
    std::fs::write(output, structured)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Converted {} entries ({} grouped, {} dropped) -> {}",
        total,
        report.grouped.len(),
        report.dropped.len(),
        output.display()
    );
    for label in &report.dropped {
        tracing::warn!(%label, "entry not representable in structured output");
    }
    Ok(())
}

async fn run(
    config: Option<PathBuf>,
    mapping: Option<PathBuf>,
    interval_ms: Option<u64>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => SimConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(mapping) = mapping {
        config.mapping_path = mapping;
    }
    if let Some(interval_ms) = interval_ms {
        config.tick_interval_ms = interval_ms;
    }

    let space = Arc::new(AddressSpace::from_mapping_file(&config.mapping_path));
    tracing::info!(
        server = %config.server_name,
        nodes = space.len(),
        "simulation server running, press Ctrl-C to stop"
    );

    let scheduler = UpdateScheduler::with_interval(space.clone(), config.tick_interval());
    scheduler
        .start()
        .await
        .context("failed to start update scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutting down");
    scheduler.stop().await;

    // Final state of every node after the last completed update pass.
    let snapshot = space.snapshot();
    if !snapshot.is_empty() {
        println!("{:<24} {:<40} {:<10} {}", "Address", "Name", "Kind", "Value");
        for node in &snapshot {
            println!(
                "{:<24} {:<40} {:<10} {}",
                node.address, node.name, node.kind, node.value
            );
        }
    }
    tracing::info!(ticks = scheduler.ticks(), "scheduler stopped");
    Ok(())
}

fn list(mapping: &Path) -> Result<()> {
    let doc = read_mapping_file(mapping)
        .with_context(|| format!("failed to load {}", mapping.display()))?;

    println!("{:<60} {:<20} {}", "Label", "NodeId", "Kind");
    for entry in &doc.entries {
        println!(
            "{:<60} {:<20} {}",
            entry.label, entry.node_id, entry.data_kind
        );
    }
    println!("{} entries", doc.entries.len());
    Ok(())
}
