//! # bsync CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::process::ExitCode;

use clap::Parser;

/// Beacon schema synchronization toolchain.
///
/// Bundles upstream Beacon v2 JSON Schemas into self-contained documents
/// and reports structural drift against the implemented models.
#[derive(Parser, Debug)]
#[command(name = "bsync", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Bundle an upstream schema release into self-contained documents.
    Bundle(bsync_cli::bundle::BundleArgs),
    /// Compare bundled documents against the implemented model shapes.
    Drift(bsync_cli::drift::DriftArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bundle(args) => bsync_cli::bundle::run(&args),
        Commands::Drift(args) => bsync_cli::drift::run(&args),
    }
}
