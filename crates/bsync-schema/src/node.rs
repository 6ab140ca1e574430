//! # Schema Node Model
//!
//! `SchemaNode` is an explicit tagged representation of a JSON Schema
//! document tree. Representing references, compositions, and scalar type
//! descriptors as enum variants (rather than an untyped nested mapping)
//! lets every traversal be an exhaustive `match` — a missing case is a
//! compile error, not a silent skip.
//!
//! Two literal-carrier variants (`Seq`, `Value`) keep the representation
//! lossless: constraint values, `required` lists, enums, and descriptions
//! survive a `from_value`/`to_value` round trip unchanged, and JSON
//! Pointers can index into array literals by position.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use bsync_core::PrimitiveType;

/// Composition keyword of a composite schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    OneOf,
    AnyOf,
    AllOf,
}

impl CompositeKind {
    /// The JSON Schema keyword for this composition.
    pub fn keyword(self) -> &'static str {
        match self {
            CompositeKind::OneOf => "oneOf",
            CompositeKind::AnyOf => "anyOf",
            CompositeKind::AllOf => "allOf",
        }
    }

    const ALL: [CompositeKind; 3] = [
        CompositeKind::OneOf,
        CompositeKind::AnyOf,
        CompositeKind::AllOf,
    ];
}

/// One node of a schema document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// A `$ref` node carrying the reference string
    /// (`other.json#/definitions/foo`, `#/definitions/foo`, ...).
    /// Sibling keywords of `$ref` are dropped, per draft-07 semantics.
    Reference(String),

    /// A schema with a primitive `type` keyword. Remaining keywords
    /// (constraints, description, definitions, ...) are kept as ordered
    /// child nodes.
    Scalar {
        ty: PrimitiveType,
        constraints: Vec<(String, SchemaNode)>,
    },

    /// A `oneOf`/`anyOf`/`allOf` composition with its branch list and any
    /// remaining sibling keywords.
    Composite {
        kind: CompositeKind,
        branches: Vec<SchemaNode>,
        rest: Vec<(String, SchemaNode)>,
    },

    /// A `type: "array"` schema. `items` is absent for unconstrained
    /// arrays; tuple-form `items` parses as a `Seq` child.
    Array {
        items: Option<Box<SchemaNode>>,
        rest: Vec<(String, SchemaNode)>,
    },

    /// Any other JSON object: object schemas, `properties` maps,
    /// `definitions` maps, metadata blocks. Fields keep source order.
    Object(Vec<(String, SchemaNode)>),

    /// A JSON array literal (`required` lists, `enum` values, tuple
    /// `items`). Elements are addressable by numeric pointer segment.
    Seq(Vec<SchemaNode>),

    /// A JSON leaf: string, number, boolean, or null.
    Value(Value),
}

/// Object-schema view used by the drift comparator: the declared
/// properties and the required-name set of an object schema node.
#[derive(Debug)]
pub struct ObjectView<'a> {
    /// Property name → property schema, in source order.
    pub properties: Vec<(&'a str, &'a SchemaNode)>,
    /// Names listed in the `required` keyword.
    pub required: BTreeSet<&'a str>,
}

impl SchemaNode {
    /// Parse a JSON value into a schema node tree.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_object(map),
            Value::Array(items) => {
                SchemaNode::Seq(items.into_iter().map(Self::from_value).collect())
            }
            other => SchemaNode::Value(other),
        }
    }

    fn from_object(map: Map<String, Value>) -> Self {
        if let Some(Value::String(reference)) = map.get("$ref") {
            return SchemaNode::Reference(reference.clone());
        }

        for kind in CompositeKind::ALL {
            if matches!(map.get(kind.keyword()), Some(Value::Array(_))) {
                let mut branches = Vec::new();
                let mut rest = Vec::new();
                for (key, value) in map {
                    if key == kind.keyword() {
                        if let Value::Array(items) = value {
                            branches = items.into_iter().map(Self::from_value).collect();
                        }
                    } else {
                        rest.push((key, Self::from_value(value)));
                    }
                }
                return SchemaNode::Composite {
                    kind,
                    branches,
                    rest,
                };
            }
        }

        let ty_keyword = map.get("type").and_then(Value::as_str).map(str::to_owned);
        match ty_keyword.as_deref() {
            Some("array") => {
                let mut items = None;
                let mut rest = Vec::new();
                for (key, value) in map {
                    match key.as_str() {
                        "type" => {}
                        "items" => items = Some(Box::new(Self::from_value(value))),
                        _ => rest.push((key, Self::from_value(value))),
                    }
                }
                SchemaNode::Array { items, rest }
            }
            Some(keyword) => match PrimitiveType::parse(keyword) {
                Some(ty) => {
                    let constraints = map
                        .into_iter()
                        .filter(|(key, _)| key != "type")
                        .map(|(key, value)| (key, Self::from_value(value)))
                        .collect();
                    SchemaNode::Scalar { ty, constraints }
                }
                None => Self::plain_object(map),
            },
            None => Self::plain_object(map),
        }
    }

    fn plain_object(map: Map<String, Value>) -> Self {
        SchemaNode::Object(
            map.into_iter()
                .map(|(key, value)| (key, Self::from_value(value)))
                .collect(),
        )
    }

    /// Serialize the node tree back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            SchemaNode::Reference(reference) => {
                let mut map = Map::new();
                map.insert("$ref".to_string(), Value::String(reference.clone()));
                Value::Object(map)
            }
            SchemaNode::Scalar { ty, constraints } => {
                let mut map = Map::new();
                map.insert("type".to_string(), Value::String(ty.as_str().to_string()));
                for (key, node) in constraints {
                    map.insert(key.clone(), node.to_value());
                }
                Value::Object(map)
            }
            SchemaNode::Composite {
                kind,
                branches,
                rest,
            } => {
                let mut map = Map::new();
                map.insert(
                    kind.keyword().to_string(),
                    Value::Array(branches.iter().map(SchemaNode::to_value).collect()),
                );
                for (key, node) in rest {
                    map.insert(key.clone(), node.to_value());
                }
                Value::Object(map)
            }
            SchemaNode::Array { items, rest } => {
                let mut map = Map::new();
                map.insert("type".to_string(), Value::String("array".to_string()));
                if let Some(items) = items {
                    map.insert("items".to_string(), items.to_value());
                }
                for (key, node) in rest {
                    map.insert(key.clone(), node.to_value());
                }
                Value::Object(map)
            }
            SchemaNode::Object(fields) => {
                let mut map = Map::new();
                for (key, node) in fields {
                    map.insert(key.clone(), node.to_value());
                }
                Value::Object(map)
            }
            SchemaNode::Seq(items) => {
                Value::Array(items.iter().map(SchemaNode::to_value).collect())
            }
            SchemaNode::Value(value) => value.clone(),
        }
    }

    /// Whether this node is a reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, SchemaNode::Reference(_))
    }

    /// Whether any node in this subtree is a reference.
    pub fn contains_reference(&self) -> bool {
        match self {
            SchemaNode::Reference(_) => true,
            SchemaNode::Scalar { constraints, .. } => {
                constraints.iter().any(|(_, n)| n.contains_reference())
            }
            SchemaNode::Composite { branches, rest, .. } => {
                branches.iter().any(SchemaNode::contains_reference)
                    || rest.iter().any(|(_, n)| n.contains_reference())
            }
            SchemaNode::Array { items, rest } => {
                items.as_deref().is_some_and(SchemaNode::contains_reference)
                    || rest.iter().any(|(_, n)| n.contains_reference())
            }
            SchemaNode::Object(fields) => fields.iter().any(|(_, n)| n.contains_reference()),
            SchemaNode::Seq(items) => items.iter().any(SchemaNode::contains_reference),
            SchemaNode::Value(_) => false,
        }
    }

    /// Look up a named member of an `Object` node.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object(fields) => {
                fields.iter().find(|(k, _)| k == key).map(|(_, n)| n)
            }
            _ => None,
        }
    }

    /// The primitive type tag, if this node is a scalar-type descriptor.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            SchemaNode::Scalar { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    /// The element schema of an array descriptor.
    pub fn items(&self) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Array { items, .. } => items.as_deref(),
            _ => None,
        }
    }

    /// View an object schema's properties and required set. Returns `None`
    /// for nodes that are not plain objects (references, composites,
    /// scalars, literals).
    pub fn object_view(&self) -> Option<ObjectView<'_>> {
        if !matches!(self, SchemaNode::Object(_)) {
            return None;
        }
        let properties = match self.get("properties") {
            Some(SchemaNode::Object(props)) => props
                .iter()
                .map(|(name, node)| (name.as_str(), node))
                .collect(),
            _ => Vec::new(),
        };
        let required = match self.get("required") {
            Some(SchemaNode::Seq(items)) => items
                .iter()
                .filter_map(|item| match item {
                    SchemaNode::Value(Value::String(name)) => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            _ => BTreeSet::new(),
        };
        Some(ObjectView {
            properties,
            required,
        })
    }

    /// Short human-readable type descriptor for drift reporting:
    /// the primitive tag, `object`, `array`, `$ref:<target>`, or
    /// `oneOf[...]`-style composition markers.
    pub fn describe(&self) -> String {
        match self {
            SchemaNode::Reference(reference) => format!("$ref:{reference}"),
            SchemaNode::Scalar { ty, .. } => ty.as_str().to_string(),
            SchemaNode::Composite { kind, .. } => format!("{}[...]", kind.keyword()),
            SchemaNode::Array { .. } => "array".to_string(),
            SchemaNode::Object(_) => "object".to_string(),
            SchemaNode::Seq(_) => "array".to_string(),
            SchemaNode::Value(_) => "value".to_string(),
        }
    }
}
