//! # bsync-core — Foundational Types for beacon-sync
//!
//! Leaf crate of the beacon-sync workspace. Defines the vocabulary shared
//! between the schema pipeline and the (external) model layer:
//!
//! 1. **`SchemaName` newtype.** Logical schema names ("individual",
//!    "requestBody") are validated at construction — no bare strings keyed
//!    into manifests or output filenames.
//!
//! 2. **`PrimitiveType` tag.** The single enum used both by the schema node
//!    model (JSON Schema `type` keyword) and by model field declarations, so
//!    the drift comparator never compares free-form strings.
//!
//! 3. **Model-shape interface.** `ModelCatalog` / `ModelShape` /
//!    `ModelField` describe the fields the implemented models declare. The
//!    comparator treats a catalog as read-only input; how it was derived
//!    (introspection, export, hand-written) is the model layer's business.
//!
//! 4. **Field-name normalization.** Upstream schemas use camelCase, the
//!    models use snake_case. `normalize_field_name` folds the former into
//!    the latter so field identity survives the naming-convention boundary.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bsync-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod error;
pub mod name;
pub mod shape;

pub use error::CoreError;
pub use name::{normalize_field_name, SchemaName};
pub use shape::{FieldShape, ModelCatalog, ModelField, ModelShape, PrimitiveType};
