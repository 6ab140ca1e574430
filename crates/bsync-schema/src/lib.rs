//! # bsync-schema — Schema Bundling & Drift Detection
//!
//! The synchronization pipeline for Beacon v2 JSON Schemas: loads the
//! upstream schema tree, expands `$ref` references into self-contained
//! bundled documents, and compares the bundled result against the
//! implemented model shapes.
//!
//! ## Bundling (`loader`, `resolver`, `dereference`, `bundle`)
//!
//! [`DocumentCache`] loads and caches schema files by normalized
//! location; [`SchemaRef`] and [`resolve_pointer`] handle `$ref` parsing
//! and JSON Pointer walks; [`Dereferencer`] expands references in place,
//! preserving them where the graph is cyclic; [`Bundler::run`] drives a
//! whole [`BundlePlan`] and persists one self-contained JSON document
//! per logical schema. Key entry points:
//!
//! - [`Bundler::run`] — executes a bundle plan, isolating per-entry
//!   failures so one broken schema never aborts the run.
//! - [`load_bundled_dir`] — reads a previously persisted bundle back
//!   for comparison.
//!
//! ## Drift Detection (`drift`)
//!
//! [`drift::compare`] walks bundled schemas and declared model shapes
//! in lock-step by normalized field path and reports added, removed,
//! type-changed, and required-changed fields in a deterministic,
//! diffable [`DriftReport`].
//!
//! ## Crate Policy
//!
//! - Depends only on `bsync-core` internally.
//! - Bundled output is deterministic: identical inputs produce
//!   byte-identical documents and reports.
//! - Dereferencing never mutates source files; all expansion happens on
//!   in-memory trees and is written to a separate output directory.
//! - Cyclic references are preserved verbatim and logged, never treated
//!   as errors or drift.

pub mod bundle;
pub mod dereference;
pub mod drift;
pub mod error;
pub mod loader;
pub mod node;
pub mod resolver;

pub use bundle::{
    load_bundled_dir, BundleEntry, BundleManifest, BundlePlan, BundleSource, Bundler, ManifestEntry,
};
pub use dereference::{CycleRecord, Dereferencer};
pub use drift::{DriftEntry, DriftKind, DriftReport, EntityDrift, FieldDescriptor};
pub use error::SchemaSyncError;
pub use loader::{DocumentCache, ResolutionState, SchemaDocument};
pub use node::{CompositeKind, ObjectView, SchemaNode};
pub use resolver::{resolve_pointer, PointerFailure, SchemaRef};
