//! # Error Types
//!
//! Errors raised by the schema pipeline. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations and carry enough
//! context (document location, offending pointer) to be actionable from a
//! CI log alone.
//!
//! Propagation policy: every variant here is fatal for *one* bundle entry,
//! never for the run. The bundler records per-entry failures in the
//! manifest and keeps going; tolerated conditions (cycles) are not errors
//! and are recorded separately.

use std::path::PathBuf;

use thiserror::Error;

/// Error during schema loading, dereferencing, or bundling.
#[derive(Error, Debug)]
pub enum SchemaSyncError {
    /// An input schema file does not exist.
    #[error("schema file not found: {}", path.display())]
    FileNotFound {
        /// Location that was requested.
        path: PathBuf,
    },

    /// An input schema file exists but is not valid JSON.
    #[error("cannot parse schema file '{}': {reason}", path.display())]
    ParseFailed {
        /// Location of the unparseable file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A `$ref` target does not exist in the resolved document.
    #[error("reference '{pointer}' cannot be resolved in '{}': {reason}", location.display())]
    ReferenceNotFound {
        /// The reference string as written in the source document.
        pointer: String,
        /// Location of the document containing the reference.
        location: PathBuf,
        /// Which path segment failed, and why.
        reason: String,
    },

    /// A reference string is not a valid location + JSON Pointer pair.
    #[error("malformed reference '{reference}': {reason}")]
    MalformedReference {
        /// The offending reference string.
        reference: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// IO failure reading an input or writing a bundled document.
    #[error("io error at '{}': {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing a bundled document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
