//! # Document Loader and Cache
//!
//! Loads schema files into `SchemaDocument` trees, keyed by normalized
//! location so repeated references to the same file reuse one parsed tree.
//! The cache is populated lazily and never evicted during a bundling run;
//! it is exclusively owned by one dereferencer for the duration of that
//! run.
//!
//! The per-document `ResolutionState` exists solely to detect cycles
//! during a single dereferencing pass: a document reached while itself
//! `InProgress` signals a cycle.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::SchemaSyncError;
use crate::node::SchemaNode;

/// Resolution state of a cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Parsed but not yet dereferenced.
    Raw,
    /// Currently being dereferenced; reaching this document again means
    /// the reference graph is cyclic.
    InProgress,
    /// Fully dereferenced (modulo cycle-preserved references).
    Resolved,
}

/// A schema document: an owned node tree tagged with its source location
/// and resolution state.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Normalized source location.
    pub location: PathBuf,
    /// Root of the document tree.
    pub root: SchemaNode,
    /// Where this document is in the dereferencing lifecycle.
    pub state: ResolutionState,
}

impl SchemaDocument {
    /// Wrap an already-materialized tree as a raw document.
    pub fn new(location: impl Into<PathBuf>, root: SchemaNode) -> Self {
        Self {
            location: normalize_path(&location.into()),
            root,
            state: ResolutionState::Raw,
        }
    }
}

/// Process-scoped cache of loaded documents, keyed by normalized location.
#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: HashMap<PathBuf, SchemaDocument>,
}

impl DocumentCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Insert an already-materialized document (pre-parsed content, test
    /// fixtures). Replaces any cached document at the same location.
    pub fn insert(&mut self, document: SchemaDocument) {
        self.documents.insert(document.location.clone(), document);
    }

    /// Look up a cached document by location.
    pub fn get(&self, location: &Path) -> Option<&SchemaDocument> {
        self.documents.get(&normalize_path(location))
    }

    /// Mutable lookup by location.
    pub fn get_mut(&mut self, location: &Path) -> Option<&mut SchemaDocument> {
        self.documents.get_mut(&normalize_path(location))
    }

    /// Resolution state of a cached document, if present.
    pub fn state(&self, location: &Path) -> Option<ResolutionState> {
        self.get(location).map(|doc| doc.state)
    }

    /// Load the document at `location`, parsing and caching it on first
    /// access. Later calls for the same (normalized) location return the
    /// cached tree without touching the filesystem.
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the file does not exist, `ParseFailed` if it is
    /// not valid JSON, `Io` for other read failures.
    pub fn load(&mut self, location: &Path) -> Result<&SchemaDocument, SchemaSyncError> {
        let key = normalize_path(location);
        if !self.documents.contains_key(&key) {
            let content = std::fs::read_to_string(&key).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SchemaSyncError::FileNotFound { path: key.clone() }
                } else {
                    SchemaSyncError::Io {
                        path: key.clone(),
                        source: e,
                    }
                }
            })?;
            let value: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| SchemaSyncError::ParseFailed {
                    path: key.clone(),
                    reason: e.to_string(),
                })?;
            let document = SchemaDocument {
                location: key.clone(),
                root: SchemaNode::from_value(value),
                state: ResolutionState::Raw,
            };
            self.documents.insert(key.clone(), document);
        }
        // The entry was just inserted or already present.
        self.documents
            .get(&key)
            .ok_or(SchemaSyncError::FileNotFound { path: key })
    }
}

/// Lexically normalize a path: fold `.` away and resolve `..` against the
/// preceding component. Purely textual — the filesystem is not consulted —
/// so `dir/sub/../other.json` and `dir/other.json` cache under one key.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("a/b/../c/./d.json")),
            PathBuf::from("a/c/d.json")
        );
        assert_eq!(
            normalize_path(Path::new("/root/x/../y.json")),
            PathBuf::from("/root/y.json")
        );
        assert_eq!(normalize_path(Path::new("plain.json")), PathBuf::from("plain.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let mut cache = DocumentCache::new();
        let err = cache
            .load(Path::new("/nonexistent/schema.json"))
            .unwrap_err();
        assert!(matches!(err, SchemaSyncError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_caches_by_normalized_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity.json");
        std::fs::write(&path, r#"{"type": "string"}"#).unwrap();

        let mut cache = DocumentCache::new();
        cache.load(&path).unwrap();
        assert_eq!(cache.len(), 1);

        // Same file via an unnormalized spelling reuses the cached tree.
        let alias = dir.path().join("sub").join("..").join("entity.json");
        cache.load(&alias).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut cache = DocumentCache::new();
        let err = cache.load(&path).unwrap_err();
        assert!(matches!(err, SchemaSyncError::ParseFailed { .. }));
    }

    #[test]
    fn test_insert_pre_materialized() {
        let mut cache = DocumentCache::new();
        let doc = SchemaDocument::new(
            "/virtual/entity.json",
            SchemaNode::from_value(json!({"type": "object"})),
        );
        cache.insert(doc);
        assert_eq!(
            cache.state(Path::new("/virtual/entity.json")),
            Some(ResolutionState::Raw)
        );
    }
}
