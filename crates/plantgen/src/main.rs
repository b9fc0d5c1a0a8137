//! plantgen CLI - `PlantUML` diagram generator for level sources.
//!
//! Provides commands for:
//! - `generate`: Extract diagrams and render the changed ones
//! - `extract`: Print what the extractor finds, as JSON

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExtractArgs, GenerateArgs};
use output::Output;

/// plantgen - render `PlantUML` diagrams embedded in level sources.
#[derive(Parser)]
#[command(name = "plantgen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render all diagrams whose text or output changed.
    Generate(GenerateArgs),
    /// Print extracted shared diagrams and records as JSON.
    Extract(ExtractArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Generate(args) => args.verbose,
        Commands::Extract(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate(args) => args.execute(),
        Commands::Extract(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
