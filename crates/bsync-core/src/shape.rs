//! # Model-Shape Interface
//!
//! The drift comparator needs to know what the implemented models look
//! like: per entity, an ordered list of fields, each carrying a name, a
//! shape, and a required flag. This module defines that interface.
//!
//! The catalog is supplied by the external model layer — typically exported
//! to a JSON file — and the comparator makes no assumption about how it was
//! derived. `ModelCatalog::from_json_file` loads that exported form.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// JSON Schema primitive type tag.
///
/// Shared between the schema node model (the `type` keyword) and model
/// field declarations so type comparisons are exhaustive matches rather
/// than string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl PrimitiveType {
    /// The JSON Schema keyword spelling of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Null => "null",
        }
    }

    /// Parse a JSON Schema `type` keyword value. Returns `None` for
    /// non-primitive types ("object", "array") and unknown strings.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(PrimitiveType::String),
            "integer" => Some(PrimitiveType::Integer),
            "number" => Some(PrimitiveType::Number),
            "boolean" => Some(PrimitiveType::Boolean),
            "null" => Some(PrimitiveType::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape of one model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// A primitive-typed field.
    Primitive(PrimitiveType),
    /// A nested object with its own declared fields.
    Object {
        /// Fields of the nested object, in declaration order.
        fields: Vec<ModelField>,
    },
    /// A homogeneous array.
    Array {
        /// Shape of the array elements.
        element: Box<FieldShape>,
    },
    /// Shape intentionally left unspecified (e.g. free-form `info` blocks).
    /// Never produces a type-changed finding.
    Any,
}

impl FieldShape {
    /// The primitive tag, if this shape is primitive.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            FieldShape::Primitive(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Short human-readable descriptor ("string", "object", "array", "any").
    pub fn describe(&self) -> String {
        match self {
            FieldShape::Primitive(ty) => ty.as_str().to_string(),
            FieldShape::Object { .. } => "object".to_string(),
            FieldShape::Array { element } => format!("array<{}>", element.describe()),
            FieldShape::Any => "any".to_string(),
        }
    }
}

/// One declared model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelField {
    /// Field name, in the model layer's snake_case convention.
    pub name: String,
    /// Declared shape.
    pub shape: FieldShape,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
}

impl ModelField {
    /// Convenience constructor for a primitive field.
    pub fn primitive(name: impl Into<String>, ty: PrimitiveType, required: bool) -> Self {
        Self {
            name: name.into(),
            shape: FieldShape::Primitive(ty),
            required,
        }
    }

    /// Convenience constructor for a field with unspecified shape.
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: FieldShape::Any,
            required: false,
        }
    }
}

/// The declared shape of one entity's model: an ordered field list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelShape {
    /// Fields in declaration order.
    pub fields: Vec<ModelField>,
}

impl ModelShape {
    /// Build a shape from a field list.
    pub fn new(fields: Vec<ModelField>) -> Self {
        Self { fields }
    }

    /// Look up a field by (already normalized) name.
    pub fn field(&self, name: &str) -> Option<&ModelField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Mapping from entity name to declared model shape.
///
/// Read-only input to the drift comparator. Keys are logical schema names,
/// stored sorted so iteration order is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    entities: BTreeMap<String, ModelShape>,
}

impl ModelCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the shape for an entity, replacing any previous one.
    pub fn insert(&mut self, entity: impl Into<String>, shape: ModelShape) {
        self.entities.insert(entity.into(), shape);
    }

    /// Look up the shape for an entity.
    pub fn get(&self, entity: &str) -> Option<&ModelShape> {
        self.entities.get(entity)
    }

    /// Number of entities with declared shapes.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate entities in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelShape)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Load a catalog from the JSON file exported by the model layer.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CatalogRead` if the file cannot be read and
    /// `CoreError::CatalogParse` if it is not a valid catalog document.
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::CatalogRead {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| CoreError::CatalogParse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_type_round_trip() {
        for (s, ty) in [
            ("string", PrimitiveType::String),
            ("integer", PrimitiveType::Integer),
            ("number", PrimitiveType::Number),
            ("boolean", PrimitiveType::Boolean),
            ("null", PrimitiveType::Null),
        ] {
            assert_eq!(PrimitiveType::parse(s), Some(ty));
            assert_eq!(ty.as_str(), s);
        }
        assert_eq!(PrimitiveType::parse("object"), None);
        assert_eq!(PrimitiveType::parse("array"), None);
    }

    #[test]
    fn test_catalog_json_format() {
        let json = r#"{
            "individual": {
                "fields": [
                    {"name": "id", "shape": {"primitive": "string"}, "required": true},
                    {"name": "diseases", "shape": {"array": {"element": "any"}}},
                    {"name": "info", "shape": "any"}
                ]
            }
        }"#;
        let catalog: ModelCatalog = serde_json::from_str(json).unwrap();
        let shape = catalog.get("individual").unwrap();
        assert_eq!(shape.fields.len(), 3);
        assert_eq!(
            shape.field("id").unwrap().shape.primitive(),
            Some(PrimitiveType::String)
        );
        assert!(shape.field("id").unwrap().required);
        assert!(!shape.field("diseases").unwrap().required);
        assert_eq!(shape.field("info").unwrap().shape, FieldShape::Any);
    }

    #[test]
    fn test_catalog_iteration_sorted() {
        let mut catalog = ModelCatalog::new();
        catalog.insert("run", ModelShape::default());
        catalog.insert("analysis", ModelShape::default());
        catalog.insert("cohort", ModelShape::default());
        let names: Vec<&str> = catalog.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["analysis", "cohort", "run"]);
    }

    #[test]
    fn test_field_shape_describe() {
        assert_eq!(
            FieldShape::Primitive(PrimitiveType::Integer).describe(),
            "integer"
        );
        assert_eq!(
            FieldShape::Array {
                element: Box::new(FieldShape::Any)
            }
            .describe(),
            "array<any>"
        );
        assert_eq!(FieldShape::Object { fields: vec![] }.describe(), "object");
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = ModelCatalog::from_json_file(Path::new("/nonexistent/catalog.json"))
            .unwrap_err();
        assert!(matches!(err, CoreError::CatalogRead { .. }));
    }
}
