//! # Drift Subcommand
//!
//! Compares a bundled output directory against the exported model
//! catalog and prints the drift report to stdout. Exit status is
//! failure when any drift is found, so CI can gate on it directly.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use tracing::info;

use bsync_core::ModelCatalog;
use bsync_schema::{drift, load_bundled_dir};

/// Arguments for the drift subcommand.
#[derive(Args, Debug)]
pub struct DriftArgs {
    /// Directory of bundled schema documents (output of `bsync bundle`).
    #[arg(long)]
    pub bundled: PathBuf,

    /// Model catalog file exported by the model layer.
    #[arg(long)]
    pub models: PathBuf,
}

/// Execute the drift subcommand. Exit status is failure if any drift
/// was found.
pub fn run(args: &DriftArgs) -> anyhow::Result<ExitCode> {
    let documents = load_bundled_dir(&args.bundled)
        .with_context(|| format!("loading bundled schemas from {}", args.bundled.display()))?;
    let catalog = ModelCatalog::from_json_file(&args.models)
        .with_context(|| format!("loading model catalog {}", args.models.display()))?;
    info!(
        schemas = documents.len(),
        models = catalog.len(),
        "comparing bundled schemas against models"
    );

    let report = drift::compare(&documents, &catalog);
    println!("{report}");

    if report.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
