//! # Bundle Subcommand
//!
//! Runs the bundling pipeline over an upstream release checkout and
//! persists self-contained documents. Per-entry failures are printed
//! and reflected in the exit status, but never abort the run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use bsync_schema::{BundlePlan, Bundler};

use crate::plan::default_plan;

/// Arguments for the bundle subcommand.
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Root of the upstream schema release checkout.
    #[arg(long)]
    pub input: PathBuf,

    /// Directory for the bundled output documents (created if absent).
    #[arg(long)]
    pub output: PathBuf,

    /// Bundle plan file (JSON array of entries). Defaults to the
    /// standard Beacon v2 release layout.
    #[arg(long)]
    pub plan: Option<PathBuf>,
}

/// Execute the bundle subcommand. Exit status is failure if any entry
/// failed to bundle.
pub fn run(args: &BundleArgs) -> anyhow::Result<ExitCode> {
    let plan = match &args.plan {
        Some(path) => BundlePlan::from_json_file(path)
            .with_context(|| format!("loading bundle plan {}", path.display()))?,
        None => default_plan(),
    };
    info!(
        entries = plan.entries.len(),
        input = %args.input.display(),
        output = %args.output.display(),
        "starting bundle run"
    );

    let bundler = Bundler::new(&args.input, &args.output);
    let manifest = bundler.run(&plan).context("bundle run failed")?;

    for (name, error) in manifest.failures() {
        eprintln!("FAILED  {name}: {error}");
    }
    println!(
        "bundled {} of {} schemas into {}",
        manifest.success_count(),
        manifest.entries().len(),
        args.output.display()
    );

    if manifest.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(failed = manifest.failure_count(), "bundle run had failures");
        Ok(ExitCode::FAILURE)
    }
}
