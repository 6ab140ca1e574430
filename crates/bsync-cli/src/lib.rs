//! # bsync-cli — Beacon Schema Synchronization CLI
//!
//! Command-line front end for the bundling and drift-detection pipeline
//! in `bsync-schema`. Designed to run in CI: exit status reflects
//! whether the schemas and models are in sync.
//!
//! ## Subcommands
//!
//! - `bundle` — dereference an upstream schema release into
//!   self-contained bundled documents
//! - `drift` — compare bundled documents against the implemented model
//!   shapes and print a drift report
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `bsync-schema` — no pipeline logic here.
//! - Reports go to stdout, diagnostics to stderr via `tracing`, so CI can
//!   archive the report alone.

pub mod bundle;
pub mod drift;
pub mod plan;
