//! # Dereferencer
//!
//! Walks a schema document depth-first, pre-order, replacing every
//! reference node with a deep copy of its resolved target so the output
//! document is self-contained.
//!
//! Cycle policy: a reference whose target document is an ancestor of the
//! current resolution stack (marked `InProgress` in the cache), or whose
//! pointer is already on the intra-document frame stack, is preserved
//! as-is instead of being expanded infinitely. This is deliberately lossy:
//! callers must tolerate residual reference nodes in the output for cyclic
//! schemas. Tolerated cycles are recorded and logged at `warn`; they are
//! not errors.
//!
//! Unresolvable references abort dereferencing of the current document
//! only — the bundler still attempts sibling documents.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::SchemaSyncError;
use crate::loader::{normalize_path, DocumentCache, ResolutionState};
use crate::node::SchemaNode;
use crate::resolver::{resolve_pointer, SchemaRef};

/// One tolerated cycle: where it was found and the reference left
/// unexpanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    /// Document in which the reference was preserved.
    pub location: PathBuf,
    /// The preserved reference string.
    pub reference: String,
}

/// Dereferences documents against an exclusively-owned [`DocumentCache`].
///
/// One dereferencer spans one bundling run: the cache is populated lazily,
/// never evicted, and shared across all entries of the run so repeated
/// references to the same file parse it once.
#[derive(Debug, Default)]
pub struct Dereferencer {
    cache: DocumentCache,
    cycles: Vec<CycleRecord>,
}

impl Dereferencer {
    /// A dereferencer with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dereferencer over a pre-populated cache (materialized content,
    /// test fixtures).
    pub fn with_cache(cache: DocumentCache) -> Self {
        Self {
            cache,
            cycles: Vec::new(),
        }
    }

    /// The document cache.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// Mutable access to the document cache.
    pub fn cache_mut(&mut self) -> &mut DocumentCache {
        &mut self.cache
    }

    /// Cycles tolerated so far in this run.
    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    /// Dereference the document at `location` and return a deep copy of
    /// its fully resolved root.
    ///
    /// Idempotent: a document with no reference nodes (or only
    /// cycle-preserved ones) comes back structurally identical.
    ///
    /// # Errors
    ///
    /// Any loading or resolution failure aborts this document and leaves
    /// it `Raw` in the cache; the error identifies the offending pointer
    /// and document.
    pub fn dereference(&mut self, location: &Path) -> Result<SchemaNode, SchemaSyncError> {
        let location = normalize_path(location);
        self.ensure_loaded(&location)?;
        self.dereference_document(&location)?;
        match self.cache.get(&location) {
            Some(doc) => Ok(doc.root.clone()),
            None => Err(SchemaSyncError::FileNotFound { path: location }),
        }
    }

    fn ensure_loaded(&mut self, location: &Path) -> Result<(), SchemaSyncError> {
        if self.cache.get(location).is_none() {
            self.cache.load(location)?;
        }
        Ok(())
    }

    fn dereference_document(&mut self, location: &Path) -> Result<(), SchemaSyncError> {
        if self.cache.state(location) == Some(ResolutionState::Resolved) {
            return Ok(());
        }
        self.ensure_loaded(location)?;

        let snapshot = match self.cache.get(location) {
            Some(doc) => doc.root.clone(),
            None => {
                return Err(SchemaSyncError::FileNotFound {
                    path: location.to_path_buf(),
                })
            }
        };
        if let Some(doc) = self.cache.get_mut(location) {
            doc.state = ResolutionState::InProgress;
        }

        let mut frames = Vec::new();
        let result = self.dereference_node(snapshot.clone(), location, &snapshot, &mut frames);
        match result {
            Ok(root) => {
                if let Some(doc) = self.cache.get_mut(location) {
                    doc.root = root;
                    doc.state = ResolutionState::Resolved;
                }
                Ok(())
            }
            Err(error) => {
                // Leave the document raw so a later entry hitting it again
                // fails with the same resolution error, not a bogus cycle.
                if let Some(doc) = self.cache.get_mut(location) {
                    doc.state = ResolutionState::Raw;
                }
                Err(error)
            }
        }
    }

    fn dereference_node(
        &mut self,
        node: SchemaNode,
        location: &Path,
        snapshot: &SchemaNode,
        frames: &mut Vec<String>,
    ) -> Result<SchemaNode, SchemaSyncError> {
        match node {
            SchemaNode::Reference(reference) => {
                self.dereference_reference(&reference, location, snapshot, frames)
            }
            SchemaNode::Scalar { ty, constraints } => Ok(SchemaNode::Scalar {
                ty,
                constraints: self.dereference_fields(constraints, location, snapshot, frames)?,
            }),
            SchemaNode::Composite {
                kind,
                branches,
                rest,
            } => Ok(SchemaNode::Composite {
                kind,
                branches: branches
                    .into_iter()
                    .map(|b| self.dereference_node(b, location, snapshot, frames))
                    .collect::<Result<_, _>>()?,
                rest: self.dereference_fields(rest, location, snapshot, frames)?,
            }),
            SchemaNode::Array { items, rest } => Ok(SchemaNode::Array {
                items: match items {
                    Some(items) => Some(Box::new(self.dereference_node(
                        *items, location, snapshot, frames,
                    )?)),
                    None => None,
                },
                rest: self.dereference_fields(rest, location, snapshot, frames)?,
            }),
            SchemaNode::Object(fields) => Ok(SchemaNode::Object(
                self.dereference_fields(fields, location, snapshot, frames)?,
            )),
            SchemaNode::Seq(items) => Ok(SchemaNode::Seq(
                items
                    .into_iter()
                    .map(|item| self.dereference_node(item, location, snapshot, frames))
                    .collect::<Result<_, _>>()?,
            )),
            leaf @ SchemaNode::Value(_) => Ok(leaf),
        }
    }

    fn dereference_fields(
        &mut self,
        fields: Vec<(String, SchemaNode)>,
        location: &Path,
        snapshot: &SchemaNode,
        frames: &mut Vec<String>,
    ) -> Result<Vec<(String, SchemaNode)>, SchemaSyncError> {
        fields
            .into_iter()
            .map(|(key, child)| {
                Ok((
                    key,
                    self.dereference_node(child, location, snapshot, frames)?,
                ))
            })
            .collect()
    }

    fn dereference_reference(
        &mut self,
        reference: &str,
        location: &Path,
        snapshot: &SchemaNode,
        frames: &mut Vec<String>,
    ) -> Result<SchemaNode, SchemaSyncError> {
        let parsed = SchemaRef::parse(reference)?;

        match parsed.target_location(location) {
            Some(target) if target != location => {
                self.ensure_loaded(&target)?;
                if self.cache.state(&target) == Some(ResolutionState::InProgress) {
                    warn!(
                        document = %location.display(),
                        reference,
                        "circular reference preserved unexpanded"
                    );
                    self.cycles.push(CycleRecord {
                        location: location.to_path_buf(),
                        reference: reference.to_string(),
                    });
                    return Ok(SchemaNode::Reference(reference.to_string()));
                }
                self.dereference_document(&target)?;
                let root = match self.cache.get(&target) {
                    Some(doc) => &doc.root,
                    None => return Err(SchemaSyncError::FileNotFound { path: target }),
                };
                let resolved = resolve_pointer(root, &parsed.segments).map_err(|failure| {
                    SchemaSyncError::ReferenceNotFound {
                        pointer: reference.to_string(),
                        location: location.to_path_buf(),
                        reason: failure.to_string(),
                    }
                })?;
                // The target document is already fully dereferenced, so the
                // copy needs no further expansion. A copied node that is
                // still a reference is a preserved cycle and stays as-is.
                Ok(resolved.clone())
            }
            _ => {
                let frame = parsed.pointer();
                if frames.contains(&frame) {
                    warn!(
                        document = %location.display(),
                        reference,
                        "circular reference preserved unexpanded"
                    );
                    self.cycles.push(CycleRecord {
                        location: location.to_path_buf(),
                        reference: reference.to_string(),
                    });
                    return Ok(SchemaNode::Reference(reference.to_string()));
                }
                let resolved = resolve_pointer(snapshot, &parsed.segments).map_err(|failure| {
                    SchemaSyncError::ReferenceNotFound {
                        pointer: reference.to_string(),
                        location: location.to_path_buf(),
                        reason: failure.to_string(),
                    }
                })?;
                let copy = resolved.clone();
                frames.push(frame);
                let result = self.dereference_node(copy, location, snapshot, frames);
                frames.pop();
                result
            }
        }
    }
}
