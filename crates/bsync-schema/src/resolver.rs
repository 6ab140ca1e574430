//! # Reference Resolver
//!
//! Parses `$ref` strings into a location part and a JSON Pointer part, and
//! walks pointers through a schema node tree.
//!
//! A reference string combines an optional location (relative path of
//! another schema file; empty means "same document") and a `#`-fragment
//! JSON Pointer with standard `~1`/`~0` escaping for `/` and `~`. Pointer
//! segments index object fields by name, sequence elements by numeric
//! position, and composition branch lists via their keyword
//! (`#/oneOf/0`).

use std::path::{Path, PathBuf};

use crate::error::SchemaSyncError;
use crate::loader::normalize_path;
use crate::node::SchemaNode;

/// A parsed reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    /// Location part, relative to the referencing document. `None` means
    /// the reference stays within the same document.
    pub location: Option<String>,
    /// Decoded pointer segments. Empty means the document root.
    pub segments: Vec<String>,
}

impl SchemaRef {
    /// Parse a reference string (`other.json#/definitions/foo`,
    /// `#/definitions/foo`, `other.json`).
    ///
    /// # Errors
    ///
    /// Returns `MalformedReference` if the fragment is non-empty but does
    /// not start with `/`.
    pub fn parse(reference: &str) -> Result<Self, SchemaSyncError> {
        let (location, fragment) = match reference.split_once('#') {
            Some((loc, frag)) => (loc, frag),
            None => (reference, ""),
        };
        let location = if location.is_empty() {
            None
        } else {
            Some(location.to_string())
        };

        let segments = if fragment.is_empty() {
            Vec::new()
        } else if let Some(path) = fragment.strip_prefix('/') {
            path.split('/').map(unescape_segment).collect()
        } else {
            return Err(SchemaSyncError::MalformedReference {
                reference: reference.to_string(),
                reason: "fragment must be empty or start with '/'".to_string(),
            });
        };

        Ok(Self { location, segments })
    }

    /// Absolute location of the referenced document, resolved against the
    /// referencing document's own location. `None` means the reference
    /// targets the same document.
    pub fn target_location(&self, referencing: &Path) -> Option<PathBuf> {
        self.location.as_ref().map(|rel| {
            let base = referencing.parent().unwrap_or_else(|| Path::new(""));
            normalize_path(&base.join(rel))
        })
    }

    /// Render the pointer part back as a fragment string, for error
    /// messages.
    pub fn pointer(&self) -> String {
        if self.segments.is_empty() {
            "#".to_string()
        } else {
            let escaped: Vec<String> = self.segments.iter().map(|s| escape_segment(s)).collect();
            format!("#/{}", escaped.join("/"))
        }
    }
}

/// Decode one pointer segment: `~1` → `/`, then `~0` → `~` (RFC 6901
/// ordering, so `~01` decodes to `~1`).
fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Encode one pointer segment, inverse of [`unescape_segment`].
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Why a pointer walk failed.
#[derive(Debug, Clone)]
pub struct PointerFailure {
    /// The segment that could not be followed.
    pub segment: String,
    /// Explanation of the failure.
    pub reason: String,
}

impl std::fmt::Display for PointerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment '{}': {}", self.segment, self.reason)
    }
}

/// Walking position: either a regular node or the branch list of a
/// composite schema (entered via its keyword, left via a numeric index).
enum Cursor<'a> {
    Node(&'a SchemaNode),
    Branches(&'a [SchemaNode]),
}

/// Walk `segments` from `root`, returning the addressed node.
///
/// Fails if any segment is absent, indexes into a literal, or traverses
/// an unresolved reference mid-path. The *final* node may itself be a
/// reference; chasing it is the dereferencer's job.
pub fn resolve_pointer<'a>(
    root: &'a SchemaNode,
    segments: &[String],
) -> Result<&'a SchemaNode, PointerFailure> {
    let mut cursor = Cursor::Node(root);
    for segment in segments {
        cursor = step(cursor, segment)?;
    }
    match cursor {
        Cursor::Node(node) => Ok(node),
        Cursor::Branches(_) => Err(PointerFailure {
            segment: segments.last().cloned().unwrap_or_default(),
            reason: "pointer ends on a composition keyword, not a schema".to_string(),
        }),
    }
}

fn step<'a>(cursor: Cursor<'a>, segment: &str) -> Result<Cursor<'a>, PointerFailure> {
    let missing = |reason: &str| PointerFailure {
        segment: segment.to_string(),
        reason: reason.to_string(),
    };

    match cursor {
        Cursor::Branches(branches) => {
            let index: usize = segment
                .parse()
                .map_err(|_| missing("composition branches are indexed numerically"))?;
            branches
                .get(index)
                .map(Cursor::Node)
                .ok_or_else(|| missing("branch index out of range"))
        }
        Cursor::Node(node) => match node {
            SchemaNode::Object(fields) => fields
                .iter()
                .find(|(key, _)| key == segment)
                .map(|(_, child)| Cursor::Node(child))
                .ok_or_else(|| missing("no such key in object")),
            SchemaNode::Scalar { constraints, .. } => constraints
                .iter()
                .find(|(key, _)| key == segment)
                .map(|(_, child)| Cursor::Node(child))
                .ok_or_else(|| missing("no such keyword in scalar schema")),
            SchemaNode::Composite {
                kind,
                branches,
                rest,
            } => {
                if segment == kind.keyword() {
                    Ok(Cursor::Branches(branches))
                } else {
                    rest.iter()
                        .find(|(key, _)| key == segment)
                        .map(|(_, child)| Cursor::Node(child))
                        .ok_or_else(|| missing("no such keyword in composite schema"))
                }
            }
            SchemaNode::Array { items, rest } => {
                if segment == "items" {
                    items
                        .as_deref()
                        .map(Cursor::Node)
                        .ok_or_else(|| missing("array schema has no items"))
                } else {
                    rest.iter()
                        .find(|(key, _)| key == segment)
                        .map(|(_, child)| Cursor::Node(child))
                        .ok_or_else(|| missing("no such keyword in array schema"))
                }
            }
            SchemaNode::Seq(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| missing("sequences are indexed numerically"))?;
                items
                    .get(index)
                    .map(Cursor::Node)
                    .ok_or_else(|| missing("sequence index out of range"))
            }
            SchemaNode::Reference(_) => {
                Err(missing("path traverses an unresolved reference"))
            }
            SchemaNode::Value(_) => Err(missing("cannot index into a literal value")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_same_document() {
        let r = SchemaRef::parse("#/definitions/foo/bar").unwrap();
        assert_eq!(r.location, None);
        assert_eq!(r.segments, vec!["definitions", "foo", "bar"]);
    }

    #[test]
    fn test_parse_cross_document() {
        let r = SchemaRef::parse("../common/sex.json#/definitions/Sex").unwrap();
        assert_eq!(r.location.as_deref(), Some("../common/sex.json"));
        assert_eq!(r.segments, vec!["definitions", "Sex"]);
    }

    #[test]
    fn test_parse_whole_document() {
        let r = SchemaRef::parse("other.json").unwrap();
        assert_eq!(r.location.as_deref(), Some("other.json"));
        assert!(r.segments.is_empty());

        let r = SchemaRef::parse("other.json#").unwrap();
        assert!(r.segments.is_empty());
    }

    #[test]
    fn test_parse_escaped_segments() {
        let r = SchemaRef::parse("#/defs/a~1b/c~0d").unwrap();
        assert_eq!(r.segments, vec!["a/b", "c~d"]);
        // RFC 6901: "~01" decodes to "~1", not "/".
        let r = SchemaRef::parse("#/x~01y").unwrap();
        assert_eq!(r.segments, vec!["x~1y"]);
    }

    #[test]
    fn test_parse_rejects_bad_fragment() {
        let err = SchemaRef::parse("#definitions/foo").unwrap_err();
        assert!(matches!(err, SchemaSyncError::MalformedReference { .. }));
    }

    #[test]
    fn test_target_location_relative() {
        let r = SchemaRef::parse("../common/sex.json#/a").unwrap();
        assert_eq!(
            r.target_location(Path::new("/schemas/models/individual.json")),
            Some(PathBuf::from("/schemas/common/sex.json"))
        );

        let same = SchemaRef::parse("#/a").unwrap();
        assert_eq!(same.target_location(Path::new("/schemas/x.json")), None);
    }

    #[test]
    fn test_pointer_round_trip_rendering() {
        let r = SchemaRef::parse("#/defs/a~1b").unwrap();
        assert_eq!(r.pointer(), "#/defs/a~1b");
    }

    #[test]
    fn test_resolve_into_definitions() {
        let root = SchemaNode::from_value(json!({
            "definitions": {
                "foo": {"bar": {"type": "string"}}
            }
        }));
        let r = SchemaRef::parse("#/definitions/foo/bar").unwrap();
        let node = resolve_pointer(&root, &r.segments).unwrap();
        assert_eq!(node.to_value(), json!({"type": "string"}));
    }

    #[test]
    fn test_resolve_into_composition_branch() {
        let root = SchemaNode::from_value(json!({
            "oneOf": [{"type": "string"}, {"type": "integer"}]
        }));
        let r = SchemaRef::parse("#/oneOf/1").unwrap();
        let node = resolve_pointer(&root, &r.segments).unwrap();
        assert_eq!(node.to_value(), json!({"type": "integer"}));
    }

    #[test]
    fn test_resolve_into_sequence() {
        let root = SchemaNode::from_value(json!({"enum": ["a", "b", "c"]}));
        // "enum" lives inside an Object node here (no "type" keyword).
        let r = SchemaRef::parse("#/enum/2").unwrap();
        let node = resolve_pointer(&root, &r.segments).unwrap();
        assert_eq!(node.to_value(), json!("c"));
    }

    #[test]
    fn test_resolve_missing_key_fails() {
        let root = SchemaNode::from_value(json!({"definitions": {}}));
        let r = SchemaRef::parse("#/definitions/absent").unwrap();
        let err = resolve_pointer(&root, &r.segments).unwrap_err();
        assert_eq!(err.segment, "absent");
    }

    #[test]
    fn test_resolve_root_pointer() {
        let root = SchemaNode::from_value(json!({"type": "object"}));
        let node = resolve_pointer(&root, &[]).unwrap();
        assert_eq!(node.to_value(), json!({"type": "object"}));
    }

    #[test]
    fn test_resolve_through_array_items() {
        let root = SchemaNode::from_value(json!({
            "type": "object",
            "properties": {
                "xs": {"type": "array", "items": {"type": "number"}}
            }
        }));
        let r = SchemaRef::parse("#/properties/xs/items").unwrap();
        let node = resolve_pointer(&root, &r.segments).unwrap();
        assert_eq!(node.to_value(), json!({"type": "number"}));
    }
}
