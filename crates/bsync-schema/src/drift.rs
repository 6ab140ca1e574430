//! # Drift Comparator
//!
//! Walks a bundled schema tree and the declared model shape in lock-step
//! by field path and reports semantically meaningful differences: fields
//! added upstream, fields the models still carry but the schema dropped,
//! primitive type changes, and required-ness changes.
//!
//! Comparison is structural. Key ordering, whitespace, and `$ref` vs
//! expanded form after dereferencing never produce findings. Field
//! comparison order is alphabetical at every level, so the report is
//! byte-stable across runs on unchanged inputs and diffable across CI
//! runs.
//!
//! Severity is informational: the comparator reports, the caller decides
//! which drift kinds are acceptable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bsync_core::{normalize_field_name, FieldShape, ModelCatalog, ModelField, SchemaName};

use crate::bundle::BundleManifest;
use crate::node::SchemaNode;

/// Kind of one reported difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftKind {
    /// The schema declares a field the model does not have.
    Added,
    /// The model declares a field the schema no longer has (stale).
    Removed,
    /// Both sides declare the field with different primitive types.
    TypeChanged,
    /// Both sides declare the field with different required-ness.
    RequiredChanged,
}

impl DriftKind {
    const ALL: [DriftKind; 4] = [
        DriftKind::Added,
        DriftKind::Removed,
        DriftKind::TypeChanged,
        DriftKind::RequiredChanged,
    ];

    fn heading(self) -> &'static str {
        match self {
            DriftKind::Added => "ADDED (in schema, not in model)",
            DriftKind::Removed => "REMOVED (in model, not in schema)",
            DriftKind::TypeChanged => "TYPE CHANGED",
            DriftKind::RequiredChanged => "REQUIRED CHANGED",
        }
    }
}

/// Type descriptor of one side of a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Short type description ("string", "object", "array<any>",
    /// "oneOf[...]").
    pub ty: String,
    /// Whether the side declares the field required.
    pub required: bool,
}

/// One reported difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftEntry {
    /// Normalized field path from the entity root. Empty for
    /// whole-entity findings.
    pub path: Vec<String>,
    /// What changed.
    pub kind: DriftKind,
    /// Descriptor on the model side, if the model declares the field.
    pub previous: Option<FieldDescriptor>,
    /// Descriptor on the schema side, if the schema declares the field.
    pub current: Option<FieldDescriptor>,
}

impl DriftEntry {
    fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Drift findings for one entity.
#[derive(Debug)]
pub struct EntityDrift {
    /// The entity compared.
    pub entity: SchemaName,
    /// Number of top-level fields the bundled schema declares.
    pub schema_field_count: usize,
    /// Number of top-level fields the model declares.
    pub model_field_count: usize,
    /// False when no model shape was available for this entity.
    pub model_available: bool,
    /// Findings, in alphabetical walk order.
    pub entries: Vec<DriftEntry>,
}

/// Ordered drift findings plus per-kind summary counts.
#[derive(Debug, Default)]
pub struct DriftReport {
    entities: Vec<EntityDrift>,
}

impl DriftReport {
    /// Per-entity findings, in comparison order.
    pub fn entities(&self) -> &[EntityDrift] {
        &self.entities
    }

    /// All findings across entities.
    pub fn entries(&self) -> impl Iterator<Item = &DriftEntry> {
        self.entities.iter().flat_map(|e| e.entries.iter())
    }

    /// Total number of findings.
    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }

    /// Number of findings of one kind.
    pub fn count(&self, kind: DriftKind) -> usize {
        self.entries().filter(|e| e.kind == kind).count()
    }

    /// Whether no drift was found.
    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }
}

/// Compare bundled documents against the declared model shapes.
///
/// `documents` supplies (name, bundled tree) pairs — either straight from
/// a manifest or re-loaded from the persisted output directory; the
/// comparator makes no distinction.
pub fn compare(documents: &[(SchemaName, SchemaNode)], catalog: &ModelCatalog) -> DriftReport {
    let mut report = DriftReport::default();
    for (name, schema) in documents {
        report.entities.push(compare_entity(name, schema, catalog));
    }
    report
}

/// Compare the successful entries of a bundle manifest against the model
/// catalog. Failed entries are skipped — they are reported through the
/// bundler's own failure channel.
pub fn compare_manifest(manifest: &BundleManifest, catalog: &ModelCatalog) -> DriftReport {
    let documents: Vec<(SchemaName, SchemaNode)> = manifest
        .documents()
        .map(|(name, doc)| (name.clone(), doc.clone()))
        .collect();
    compare(&documents, catalog)
}

fn compare_entity(entity: &SchemaName, schema: &SchemaNode, catalog: &ModelCatalog) -> EntityDrift {
    let schema_field_count = schema
        .object_view()
        .map(|v| v.properties.len())
        .unwrap_or(0);

    let Some(shape) = catalog.get(entity.as_str()) else {
        // Model shape unavailable: the whole entity is reported as
        // removed from the implementation, not treated as a crash.
        return EntityDrift {
            entity: entity.clone(),
            schema_field_count,
            model_field_count: 0,
            model_available: false,
            entries: vec![DriftEntry {
                path: Vec::new(),
                kind: DriftKind::Removed,
                previous: None,
                current: Some(FieldDescriptor {
                    ty: schema.describe(),
                    required: false,
                }),
            }],
        };
    };

    let mut entries = Vec::new();
    let mut path = Vec::new();
    walk_object(schema, &shape.fields, &mut path, &mut entries);

    EntityDrift {
        entity: entity.clone(),
        schema_field_count,
        model_field_count: shape.fields.len(),
        model_available: true,
        entries,
    }
}

/// Compare the object level at `path`: symmetric difference of the field
/// name sets, then type/required checks and recursion for fields present
/// on both sides.
fn walk_object(
    schema: &SchemaNode,
    model_fields: &[ModelField],
    path: &mut Vec<String>,
    entries: &mut Vec<DriftEntry>,
) {
    let view = schema.object_view();
    let empty_required = BTreeSet::new();
    let (properties, required): (&[(&str, &SchemaNode)], &BTreeSet<&str>) = match &view {
        Some(v) => (v.properties.as_slice(), &v.required),
        None => (&[], &empty_required),
    };

    // Schema side, keyed by normalized name.
    let mut schema_side: BTreeMap<String, (&str, &SchemaNode)> = BTreeMap::new();
    for (name, node) in properties {
        schema_side.insert(normalize_field_name(name), (*name, *node));
    }
    // Model side, assumed already snake_case.
    let mut model_side: BTreeMap<&str, &ModelField> = BTreeMap::new();
    for field in model_fields {
        model_side.insert(field.name.as_str(), field);
    }

    let mut names: Vec<String> = schema_side.keys().cloned().collect();
    for name in model_side.keys() {
        if !schema_side.contains_key(*name) {
            names.push((*name).to_string());
        }
    }
    names.sort();

    for name in names {
        let schema_field = schema_side.get(&name);
        let model_field = model_side.get(name.as_str()).copied();

        match (schema_field, model_field) {
            (Some((original, node)), None) => {
                path.push(name.clone());
                entries.push(DriftEntry {
                    path: path.clone(),
                    kind: DriftKind::Added,
                    previous: None,
                    current: Some(FieldDescriptor {
                        ty: node.describe(),
                        required: required.contains(original),
                    }),
                });
                path.pop();
            }
            (None, Some(field)) => {
                // Reserved model-layer names never count as drift.
                if field.name.starts_with("model_") {
                    continue;
                }
                path.push(name.clone());
                entries.push(DriftEntry {
                    path: path.clone(),
                    kind: DriftKind::Removed,
                    previous: Some(FieldDescriptor {
                        ty: field.shape.describe(),
                        required: field.required,
                    }),
                    current: None,
                });
                path.pop();
            }
            (Some((original, node)), Some(field)) => {
                path.push(name.clone());
                compare_field(node, required.contains(original), field, path, entries);
                path.pop();
            }
            (None, None) => {}
        }
    }
}

fn compare_field(
    node: &SchemaNode,
    schema_required: bool,
    field: &ModelField,
    path: &mut Vec<String>,
    entries: &mut Vec<DriftEntry>,
) {
    if let (Some(schema_ty), Some(model_ty)) = (node.primitive_type(), field.shape.primitive()) {
        if schema_ty != model_ty {
            entries.push(DriftEntry {
                path: path.clone(),
                kind: DriftKind::TypeChanged,
                previous: Some(FieldDescriptor {
                    ty: model_ty.to_string(),
                    required: field.required,
                }),
                current: Some(FieldDescriptor {
                    ty: schema_ty.to_string(),
                    required: schema_required,
                }),
            });
        }
    }

    if schema_required != field.required {
        entries.push(DriftEntry {
            path: path.clone(),
            kind: DriftKind::RequiredChanged,
            previous: Some(FieldDescriptor {
                ty: field.shape.describe(),
                required: field.required,
            }),
            current: Some(FieldDescriptor {
                ty: node.describe(),
                required: schema_required,
            }),
        });
    }

    // Recurse only where a nested descriptor exists on both sides; a
    // field that is itself added/removed reports nothing below it.
    match &field.shape {
        FieldShape::Object { fields } => {
            if node.object_view().is_some() {
                walk_object(node, fields, path, entries);
            }
        }
        FieldShape::Array { element } => {
            if let Some(items) = node.items() {
                compare_element(items, element, path, entries);
            }
        }
        FieldShape::Primitive(_) | FieldShape::Any => {}
    }
}

fn compare_element(
    items: &SchemaNode,
    element: &FieldShape,
    path: &mut Vec<String>,
    entries: &mut Vec<DriftEntry>,
) {
    if let (Some(schema_ty), Some(model_ty)) = (items.primitive_type(), element.primitive()) {
        if schema_ty != model_ty {
            entries.push(DriftEntry {
                path: path.clone(),
                kind: DriftKind::TypeChanged,
                previous: Some(FieldDescriptor {
                    ty: format!("array<{model_ty}>"),
                    required: false,
                }),
                current: Some(FieldDescriptor {
                    ty: format!("array<{schema_ty}>"),
                    required: false,
                }),
            });
        }
    }
    if let FieldShape::Object { fields } = element {
        if items.object_view().is_some() {
            walk_object(items, fields, path, entries);
        }
    }
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "SCHEMA DRIFT REPORT")?;
        writeln!(f, "{rule}")?;

        for entity in &self.entities {
            writeln!(f)?;
            writeln!(f, "{}", entity.entity)?;
            writeln!(f, "{}", "-".repeat(40))?;

            if !entity.model_available {
                writeln!(f, "  model shape unavailable: entity not implemented")?;
                continue;
            }

            writeln!(f, "Schema fields: {}", entity.schema_field_count)?;
            writeln!(f, "Model fields:  {}", entity.model_field_count)?;

            if entity.entries.is_empty() {
                writeln!(f)?;
                writeln!(f, "  no drift")?;
                continue;
            }

            for kind in DriftKind::ALL {
                let of_kind: Vec<&DriftEntry> =
                    entity.entries.iter().filter(|e| e.kind == kind).collect();
                if of_kind.is_empty() {
                    continue;
                }
                writeln!(f)?;
                writeln!(f, "  {} ({} fields):", kind.heading(), of_kind.len())?;
                for entry in of_kind {
                    match kind {
                        DriftKind::Added => {
                            let current = entry.current.as_ref();
                            let ty = current.map(|d| d.ty.as_str()).unwrap_or("?");
                            let req = current
                                .filter(|d| d.required)
                                .map(|_| " [REQUIRED]")
                                .unwrap_or("");
                            writeln!(f, "    + {}: {ty}{req}", entry.dotted_path())?;
                        }
                        DriftKind::Removed => {
                            let ty = entry
                                .previous
                                .as_ref()
                                .map(|d| d.ty.as_str())
                                .unwrap_or("?");
                            writeln!(f, "    - {}: {ty}", entry.dotted_path())?;
                        }
                        DriftKind::TypeChanged => {
                            let prev = entry
                                .previous
                                .as_ref()
                                .map(|d| d.ty.as_str())
                                .unwrap_or("?");
                            let curr = entry
                                .current
                                .as_ref()
                                .map(|d| d.ty.as_str())
                                .unwrap_or("?");
                            writeln!(f, "    ~ {}: {prev} -> {curr}", entry.dotted_path())?;
                        }
                        DriftKind::RequiredChanged => {
                            let describe = |required: bool| {
                                if required {
                                    "required"
                                } else {
                                    "optional"
                                }
                            };
                            let prev = entry.previous.as_ref().map(|d| d.required).unwrap_or(false);
                            let curr = entry.current.as_ref().map(|d| d.required).unwrap_or(false);
                            writeln!(
                                f,
                                "    ~ {}: {} -> {}",
                                entry.dotted_path(),
                                describe(prev),
                                describe(curr)
                            )?;
                        }
                    }
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "SUMMARY")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Entities compared: {}", self.entities.len())?;
        writeln!(f, "Added:             {}", self.count(DriftKind::Added))?;
        writeln!(f, "Removed:           {}", self.count(DriftKind::Removed))?;
        writeln!(f, "Type changed:      {}", self.count(DriftKind::TypeChanged))?;
        writeln!(
            f,
            "Required changed:  {}",
            self.count(DriftKind::RequiredChanged)
        )?;
        Ok(())
    }
}
