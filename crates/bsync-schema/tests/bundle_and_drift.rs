//! Integration test: full pipeline from an upstream-style schema tree to a
//! drift report.
//!
//! Builds a miniature release layout (pre-resolved model schemas plus
//! framework schemas with cross-document `$ref`s), bundles it, re-loads
//! the persisted output, and compares against a model catalog.

use std::path::{Path, PathBuf};

use serde_json::json;

use bsync_core::{ModelCatalog, ModelField, ModelShape, PrimitiveType, SchemaName};
use bsync_schema::drift::{self, DriftKind};
use bsync_schema::{load_bundled_dir, BundleEntry, BundlePlan, BundleSource, Bundler};

fn write(root: &Path, rel: &str, value: serde_json::Value) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn name(s: &str) -> SchemaName {
    SchemaName::new(s).unwrap()
}

/// Lay out a small upstream release: two pre-resolved entity schemas and
/// one framework schema whose parts live in sibling files.
fn upstream_tree(root: &Path) {
    write(
        root,
        "models/individual/defaultSchema.json",
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "geographicOrigin": {"type": "string"},
                "karyotypicSex": {"type": "string"}
            },
            "required": ["id"]
        }),
    );
    write(
        root,
        "models/biosample/defaultSchema.json",
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "individualId": {"type": "string"}
            },
            "required": ["id"]
        }),
    );
    write(
        root,
        "framework/responses/beaconBooleanResponse.json",
        json!({
            "type": "object",
            "properties": {
                "meta": {"$ref": "./sections/beaconResponseMeta.json"},
                "exists": {"type": "boolean"}
            },
            "required": ["meta", "exists"]
        }),
    );
    write(
        root,
        "framework/responses/sections/beaconResponseMeta.json",
        json!({
            "type": "object",
            "properties": {
                "beaconId": {"type": "string"},
                "apiVersion": {"$ref": "#/definitions/ApiVersion"}
            },
            "definitions": {
                "ApiVersion": {"type": "string"}
            }
        }),
    );
}

fn plan() -> BundlePlan {
    BundlePlan::new(vec![
        BundleEntry {
            name: name("individual"),
            source: BundleSource::PreResolved {
                path: PathBuf::from("models/individual/defaultSchema.json"),
            },
        },
        BundleEntry {
            name: name("biosample"),
            source: BundleSource::PreResolved {
                path: PathBuf::from("models/biosample/defaultSchema.json"),
            },
        },
        BundleEntry {
            name: name("booleanResponse"),
            source: BundleSource::Framework {
                path: PathBuf::from("framework/responses/beaconBooleanResponse.json"),
            },
        },
    ])
}

fn catalog() -> ModelCatalog {
    let mut catalog = ModelCatalog::new();
    catalog.insert(
        "individual",
        ModelShape::new(vec![
            ModelField::primitive("id", PrimitiveType::String, true),
            ModelField::primitive("geographic_origin", PrimitiveType::String, false),
            // "karyotypic_sex" intentionally absent: expected as Added.
        ]),
    );
    catalog.insert(
        "biosample",
        ModelShape::new(vec![
            ModelField::primitive("id", PrimitiveType::String, true),
            // Type mismatch on purpose: model says integer, schema string.
            ModelField::primitive("individual_id", PrimitiveType::Integer, false),
        ]),
    );
    // "booleanResponse" has no model shape: expected as whole-entity removal.
    catalog
}

#[test]
fn test_full_pipeline_bundle_then_drift() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    upstream_tree(input.path());

    let manifest = Bundler::new(input.path(), output.path())
        .run(&plan())
        .unwrap();
    assert!(manifest.is_clean(), "bundle run had failures");

    // The framework schema is fully self-contained after bundling.
    let bundled = load_bundled_dir(output.path()).unwrap();
    assert_eq!(bundled.len(), 3);
    let boolean_response = bundled
        .iter()
        .find(|(n, _)| n.as_str() == "booleanResponse")
        .map(|(_, doc)| doc)
        .unwrap();
    assert!(!boolean_response.contains_reference());
    let meta = boolean_response
        .object_view()
        .and_then(|v| {
            v.properties
                .iter()
                .find(|(k, _)| *k == "meta")
                .map(|(_, n)| n.to_value())
        })
        .unwrap();
    assert_eq!(meta["properties"]["beaconId"], json!({"type": "string"}));
    assert_eq!(meta["properties"]["apiVersion"], json!({"type": "string"}));

    let report = drift::compare(&bundled, &catalog());

    assert_eq!(report.count(DriftKind::Added), 1);
    assert_eq!(report.count(DriftKind::TypeChanged), 1);
    assert_eq!(report.count(DriftKind::Removed), 1);
    assert_eq!(report.count(DriftKind::RequiredChanged), 0);

    let added = report
        .entries()
        .find(|e| e.kind == DriftKind::Added)
        .unwrap();
    assert_eq!(added.path, vec!["karyotypic_sex"]);

    let changed = report
        .entries()
        .find(|e| e.kind == DriftKind::TypeChanged)
        .unwrap();
    assert_eq!(changed.path, vec!["individual_id"]);
    assert_eq!(changed.previous.as_ref().unwrap().ty, "integer");
    assert_eq!(changed.current.as_ref().unwrap().ty, "string");

    let removed = report
        .entries()
        .find(|e| e.kind == DriftKind::Removed)
        .unwrap();
    assert!(removed.path.is_empty(), "expected a whole-entity finding");
}

#[test]
fn test_pipeline_is_deterministic() {
    let input = tempfile::tempdir().unwrap();
    upstream_tree(input.path());
    let catalog = catalog();

    let mut renders = Vec::new();
    let mut reports = Vec::new();
    for _ in 0..2 {
        let output = tempfile::tempdir().unwrap();
        let manifest = Bundler::new(input.path(), output.path())
            .run(&plan())
            .unwrap();
        assert!(manifest.is_clean());
        renders.push(
            std::fs::read_to_string(output.path().join("booleanResponse.json")).unwrap(),
        );
        let bundled = load_bundled_dir(output.path()).unwrap();
        reports.push(drift::compare(&bundled, &catalog).to_string());
    }

    assert_eq!(renders[0], renders[1], "bundled output not byte-stable");
    assert_eq!(reports[0], reports[1], "drift report not byte-stable");
}

#[test]
fn test_bundling_leaves_sources_untouched() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    upstream_tree(input.path());

    let framework = input
        .path()
        .join("framework/responses/beaconBooleanResponse.json");
    let before = std::fs::read_to_string(&framework).unwrap();

    Bundler::new(input.path(), output.path())
        .run(&plan())
        .unwrap();

    let after = std::fs::read_to_string(&framework).unwrap();
    assert_eq!(before, after);
}
