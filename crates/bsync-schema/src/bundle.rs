//! # Schema Bundler
//!
//! Orchestrates the dereferencer across the two input categories of an
//! upstream schema release — pre-resolved entity schemas (identity copy)
//! and framework schemas (full dereferencing) — and persists one output
//! document per logical schema name.
//!
//! Entries are processed independently: a broken upstream file is recorded
//! against its own entry and never blocks inspection of the rest. The
//! persisted output directory is the only contract the drift comparator
//! relies on.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use bsync_core::SchemaName;

use crate::dereference::Dereferencer;
use crate::error::SchemaSyncError;
use crate::node::SchemaNode;

/// Where a bundle entry's content comes from. Paths are relative to the
/// bundler's input root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BundleSource {
    /// A document already known to contain no unresolved references;
    /// copied through as-is after a parse check.
    PreResolved {
        /// Input file, relative to the input root.
        path: PathBuf,
    },
    /// A document requiring full dereferencing.
    Framework {
        /// Input file, relative to the input root.
        path: PathBuf,
    },
}

impl BundleSource {
    /// The relative input path of this source.
    pub fn path(&self) -> &Path {
        match self {
            BundleSource::PreResolved { path } | BundleSource::Framework { path } => path,
        }
    }
}

/// One entry of a bundle plan: a logical output name and its input source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Logical name under which the output is persisted.
    pub name: SchemaName,
    /// Input source for this entry.
    #[serde(flatten)]
    pub source: BundleSource,
}

/// A caller-supplied bundling plan: logical names mapped to input sources,
/// decoupled from upstream file naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundlePlan {
    /// Entries in processing order.
    pub entries: Vec<BundleEntry>,
}

impl BundlePlan {
    /// A plan over the given entries.
    pub fn new(entries: Vec<BundleEntry>) -> Self {
        Self { entries }
    }

    /// Load a plan from a JSON file (an array of entries).
    ///
    /// # Errors
    ///
    /// `FileNotFound`/`Io` for read failures, `ParseFailed` for invalid
    /// plan documents.
    pub fn from_json_file(path: &Path) -> Result<Self, SchemaSyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SchemaSyncError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SchemaSyncError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        serde_json::from_str(&content).map_err(|e| SchemaSyncError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Outcome of one manifest entry.
#[derive(Debug)]
pub struct ManifestEntry {
    /// Logical name of the entry.
    pub name: SchemaName,
    /// The bundled document, or why bundling it failed.
    pub outcome: Result<SchemaNode, SchemaSyncError>,
}

/// Result of one bundling run: per-name outcomes in plan order.
///
/// Handed by value from bundler to comparator; the comparator never
/// mutates it.
#[derive(Debug, Default)]
pub struct BundleManifest {
    entries: Vec<ManifestEntry>,
}

impl BundleManifest {
    fn push(&mut self, name: SchemaName, outcome: Result<SchemaNode, SchemaSyncError>) {
        self.entries.push(ManifestEntry { name, outcome });
    }

    /// All entries, in plan order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Successfully bundled documents, in plan order.
    pub fn documents(&self) -> impl Iterator<Item = (&SchemaName, &SchemaNode)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok().map(|doc| (&e.name, doc)))
    }

    /// Failed entries with their errors, in plan order.
    pub fn failures(&self) -> impl Iterator<Item = (&SchemaName, &SchemaSyncError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|err| (&e.name, err)))
    }

    /// Number of successful entries.
    pub fn success_count(&self) -> usize {
        self.documents().count()
    }

    /// Number of failed entries.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether every entry bundled successfully.
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Bundles schemas from an input root into a flat output directory.
pub struct Bundler {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl Bundler {
    /// A bundler reading inputs under `input_root` and persisting outputs
    /// under `output_root` (created if absent).
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Run the plan. One dereferencer (and thus one document cache) spans
    /// the whole run; per-entry failures are recorded in the manifest and
    /// do not stop the remaining entries.
    ///
    /// # Errors
    ///
    /// Fails only if the output directory itself cannot be created —
    /// without it no entry can be persisted.
    pub fn run(&self, plan: &BundlePlan) -> Result<BundleManifest, SchemaSyncError> {
        std::fs::create_dir_all(&self.output_root).map_err(|e| SchemaSyncError::Io {
            path: self.output_root.clone(),
            source: e,
        })?;

        let mut dereferencer = Dereferencer::new();
        let mut manifest = BundleManifest::default();

        for entry in &plan.entries {
            let outcome = self.bundle_entry(&mut dereferencer, entry);
            match &outcome {
                Ok(_) => info!(name = %entry.name, "bundled"),
                Err(e) => error!(name = %entry.name, error = %e, "bundling failed"),
            }
            manifest.push(entry.name.clone(), outcome);
        }

        info!(
            succeeded = manifest.success_count(),
            failed = manifest.failure_count(),
            cycles = dereferencer.cycles().len(),
            "bundle run finished"
        );
        Ok(manifest)
    }

    fn bundle_entry(
        &self,
        dereferencer: &mut Dereferencer,
        entry: &BundleEntry,
    ) -> Result<SchemaNode, SchemaSyncError> {
        let input = self.input_root.join(entry.source.path());
        let root = match &entry.source {
            BundleSource::PreResolved { .. } => {
                let document = dereferencer.cache_mut().load(&input)?;
                let root = document.root.clone();
                if root.contains_reference() {
                    warn!(
                        name = %entry.name,
                        path = %input.display(),
                        "pre-resolved schema still contains references"
                    );
                }
                root
            }
            BundleSource::Framework { .. } => dereferencer.dereference(&input)?,
        };

        let output = self.output_root.join(format!("{}.json", entry.name));
        let rendered = serde_json::to_string_pretty(&root.to_value())?;
        std::fs::write(&output, format!("{rendered}\n")).map_err(|e| SchemaSyncError::Io {
            path: output.clone(),
            source: e,
        })?;
        Ok(root)
    }
}

/// Load persisted bundled documents from an output directory, sorted by
/// name. Files without a `.json` extension or with an invalid name are
/// skipped with a warning.
pub fn load_bundled_dir(dir: &Path) -> Result<Vec<(SchemaName, SchemaNode)>, SchemaSyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SchemaSyncError::FileNotFound {
                path: dir.to_path_buf(),
            }
        } else {
            SchemaSyncError::Io {
                path: dir.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut documents = Vec::new();
    for dir_entry in entries {
        let dir_entry = dir_entry.map_err(|e| SchemaSyncError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem,
            None => continue,
        };
        let name = match SchemaName::new(stem) {
            Ok(name) => name,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping bundled file");
                continue;
            }
        };
        let content = std::fs::read_to_string(&path).map_err(|e| SchemaSyncError::Io {
            path: path.clone(),
            source: e,
        })?;
        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| SchemaSyncError::ParseFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        documents.push((name, SchemaNode::from_value(value)));
    }
    documents.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    fn name(s: &str) -> SchemaName {
        SchemaName::new(s).unwrap()
    }

    #[test]
    fn test_partial_failure_isolation() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "models/individual.json",
            json!({"type": "object", "properties": {"id": {"type": "string"}}}),
        );
        write(
            input.path(),
            "framework/response.json",
            json!({"properties": {"meta": {"$ref": "sections/meta.json#/definitions/Meta"}}}),
        );
        write(
            input.path(),
            "framework/sections/meta.json",
            json!({"definitions": {"Meta": {"type": "object"}}}),
        );

        let plan = BundlePlan::new(vec![
            BundleEntry {
                name: name("individual"),
                source: BundleSource::PreResolved {
                    path: PathBuf::from("models/individual.json"),
                },
            },
            BundleEntry {
                name: name("broken"),
                source: BundleSource::Framework {
                    path: PathBuf::from("framework/missing.json"),
                },
            },
            BundleEntry {
                name: name("response"),
                source: BundleSource::Framework {
                    path: PathBuf::from("framework/response.json"),
                },
            },
        ]);

        let bundler = Bundler::new(input.path(), output.path());
        let manifest = bundler.run(&plan).unwrap();

        assert_eq!(manifest.failure_count(), 1);
        assert_eq!(manifest.success_count(), 2);
        let (failed_name, err) = manifest.failures().next().unwrap();
        assert_eq!(failed_name.as_str(), "broken");
        assert!(matches!(err, SchemaSyncError::FileNotFound { .. }));

        // The surviving entries are persisted and valid.
        assert!(output.path().join("individual.json").exists());
        assert!(output.path().join("response.json").exists());
        assert!(!output.path().join("broken.json").exists());

        let bundled = load_bundled_dir(output.path()).unwrap();
        assert_eq!(bundled.len(), 2);
        assert_eq!(bundled[0].0.as_str(), "individual");
        assert_eq!(bundled[1].0.as_str(), "response");
        assert!(!bundled[1].1.contains_reference());
    }

    #[test]
    fn test_pre_resolved_identity_copy() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = json!({
            "type": "object",
            "properties": {"id": {"type": "string"}},
            "required": ["id"]
        });
        write(input.path(), "models/run.json", source.clone());

        let plan = BundlePlan::new(vec![BundleEntry {
            name: name("run"),
            source: BundleSource::PreResolved {
                path: PathBuf::from("models/run.json"),
            },
        }]);
        let manifest = Bundler::new(input.path(), output.path())
            .run(&plan)
            .unwrap();
        assert!(manifest.is_clean());

        let persisted: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(output.path().join("run.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(persisted, source);
    }

    #[test]
    fn test_dereference_failure_recorded_per_entry() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write(
            input.path(),
            "framework/bad.json",
            json!({"properties": {"x": {"$ref": "#/definitions/absent"}}}),
        );

        let plan = BundlePlan::new(vec![BundleEntry {
            name: name("bad"),
            source: BundleSource::Framework {
                path: PathBuf::from("framework/bad.json"),
            },
        }]);
        let manifest = Bundler::new(input.path(), output.path())
            .run(&plan)
            .unwrap();
        assert_eq!(manifest.failure_count(), 1);
        let (_, err) = manifest.failures().next().unwrap();
        assert!(matches!(err, SchemaSyncError::ReferenceNotFound { .. }));
    }

    #[test]
    fn test_plan_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let plan_path = dir.path().join("plan.json");
        std::fs::write(
            &plan_path,
            r#"[
                {"name": "individual", "kind": "pre_resolved", "path": "models/individual.json"},
                {"name": "requestBody", "kind": "framework", "path": "framework/requestBody.json"}
            ]"#,
        )
        .unwrap();

        let plan = BundlePlan::from_json_file(&plan_path).unwrap();
        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.entries[0].name.as_str(), "individual");
        assert!(matches!(
            plan.entries[0].source,
            BundleSource::PreResolved { .. }
        ));
        assert!(matches!(
            plan.entries[1].source,
            BundleSource::Framework { .. }
        ));

        // Serializing back produces the same shape.
        let rendered = serde_json::to_value(&plan).unwrap();
        assert_eq!(rendered[1]["kind"], "framework");
        assert_eq!(rendered[1]["name"], "requestBody");
    }

    #[test]
    fn test_load_bundled_dir_missing() {
        let err = load_bundled_dir(Path::new("/nonexistent/bundled")).unwrap_err();
        assert!(matches!(err, SchemaSyncError::FileNotFound { .. }));
    }
}
