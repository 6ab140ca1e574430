//! # Schema Names and Field-Name Normalization
//!
//! `SchemaName` is the validated identifier under which a bundled schema is
//! keyed in the manifest and persisted to disk. Because names become output
//! filenames, path separators and empty names are rejected at construction.
//!
//! `normalize_field_name` bridges the upstream camelCase convention and the
//! snake_case convention of the implemented models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Logical name of a schema ("individual", "requestBody", ...).
///
/// Decoupled from input file naming: upstream file layout does not have to
/// match internal naming conventions, so the bundle plan maps names to
/// paths explicitly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate and wrap a logical schema name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidName` if the name is empty or contains a
    /// character that is unsafe in an output filename.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidName {
                name,
                reason: "name must not be empty".to_string(),
            });
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(CoreError::InvalidName {
                name: name.clone(),
                reason: format!("character '{bad}' is not allowed"),
            });
        }
        // Names like "." or ".." would produce degenerate output filenames.
        if !name.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidName {
                name,
                reason: "name must contain an alphanumeric character".to_string(),
            });
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SchemaName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SchemaName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SchemaName> for String {
    fn from(value: SchemaName) -> Self {
        value.0
    }
}

/// Normalize a field name for comparison (camelCase to snake_case).
///
/// Handles consecutive capitals:
///
/// - `APIResponse` → `api_response`
/// - `HTTPSConnection` → `https_connection`
/// - `XMLHttpRequest` → `xml_http_request`
/// - `camelCase` → `camel_case`
/// - `getUserID` → `get_user_id`
///
/// An underscore is inserted before an uppercase letter that either starts
/// a new lowercase run or follows a lowercase letter or digit; everything
/// is then lowercased.
pub fn normalize_field_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if next_lower || prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["individual", "requestBody", "beacon-map", "info.v2", "run_1"] {
            assert!(SchemaName::new(name).is_ok(), "expected '{name}' to be valid");
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = SchemaName::new("").unwrap_err();
        assert!(matches!(err, CoreError::InvalidName { .. }));
    }

    #[test]
    fn test_path_separators_rejected() {
        assert!(SchemaName::new("a/b").is_err());
        assert!(SchemaName::new("a\\b").is_err());
        assert!(SchemaName::new("a b").is_err());
    }

    #[test]
    fn test_names_without_alphanumerics_rejected() {
        for name in [".", "..", "...", "-", "_", "-._"] {
            assert!(
                SchemaName::new(name).is_err(),
                "expected '{name}' to be rejected"
            );
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let name = SchemaName::new("genomicVariation").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"genomicVariation\"");
        let back: SchemaName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let result: Result<SchemaName, _> = serde_json::from_str("\"a/b\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_plain_camel_case() {
        assert_eq!(normalize_field_name("camelCase"), "camel_case");
        assert_eq!(normalize_field_name("geographicOrigin"), "geographic_origin");
        assert_eq!(
            normalize_field_name("interventionsOrProcedures"),
            "interventions_or_procedures"
        );
    }

    #[test]
    fn test_normalize_consecutive_capitals() {
        assert_eq!(normalize_field_name("APIResponse"), "api_response");
        assert_eq!(normalize_field_name("HTTPSConnection"), "https_connection");
        assert_eq!(normalize_field_name("XMLHttpRequest"), "xml_http_request");
        assert_eq!(normalize_field_name("getUserID"), "get_user_id");
    }

    #[test]
    fn test_normalize_already_snake() {
        assert_eq!(normalize_field_name("individual_id"), "individual_id");
        assert_eq!(normalize_field_name("id"), "id");
    }

    #[test]
    fn test_normalize_digit_boundary() {
        assert_eq!(normalize_field_name("sha256Digest"), "sha256_digest");
    }
}
