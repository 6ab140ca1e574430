//! # Error Types
//!
//! Errors raised by the core vocabulary types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error constructing or loading core types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A logical schema name failed validation.
    #[error("invalid schema name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A model catalog file could not be read.
    #[error("cannot read model catalog '{path}': {source}")]
    CatalogRead {
        /// Path to the catalog file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A model catalog file could not be parsed.
    #[error("cannot parse model catalog '{path}': {source}")]
    CatalogParse {
        /// Path to the catalog file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
