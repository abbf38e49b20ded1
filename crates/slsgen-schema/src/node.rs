//! Typed view of a raw schema node.

use serde_json::{Map, Value};

/// Keyword map of a schema object.
pub type Keywords = Map<String, Value>;

/// Keywords the downstream gateway accepts on an object property.
pub const SUPPORTED_KEYWORDS: &[&str] = &[
    "$ref",
    "type",
    "properties",
    "required",
    "enum",
    "items",
    "minLength",
    "maxLength",
    "minimum",
    "maximum",
    "pattern",
    "format",
    "title",
    "description",
    "default",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
];

/// Drop every keyword not in [`SUPPORTED_KEYWORDS`].
pub fn retain_supported(keywords: &mut Keywords) {
    keywords.retain(|k, _| SUPPORTED_KEYWORDS.contains(&k.as_str()));
}

/// Composition keywords, in the order they are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKeyword {
    AnyOf,
    OneOf,
    AllOf,
}

impl CompositeKeyword {
    pub const ALL: [CompositeKeyword; 3] = [Self::AnyOf, Self::OneOf, Self::AllOf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
            Self::AllOf => "allOf",
        }
    }
}

/// A schema node classified by the keyword that drives its resolution.
///
/// Classification order: `$ref`, array with `items`, object with
/// `properties`, composition keywords, then everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `$ref`; siblings are ignored.
    Reference { target: String },
    /// `type: array` with `items`.
    Array {
        items: Box<SchemaNode>,
        keywords: Keywords,
    },
    /// `type: object` with `properties`.
    Object {
        properties: Vec<(String, SchemaNode)>,
        keywords: Keywords,
    },
    /// One or more of `anyOf`, `oneOf`, `allOf`.
    Composite {
        compositions: Vec<(CompositeKeyword, Vec<SchemaNode>)>,
        keywords: Keywords,
    },
    /// Anything else, kept as-is.
    Leaf(Value),
}

impl SchemaNode {
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(object) = value else {
            return SchemaNode::Leaf(value.clone());
        };

        if let Some(target) = object.get("$ref").and_then(Value::as_str) {
            return SchemaNode::Reference {
                target: target.to_string(),
            };
        }

        let type_is = |name: &str| object.get("type").and_then(Value::as_str) == Some(name);

        if type_is("array") {
            if let Some(items) = object.get("items").filter(|v| !v.is_null()) {
                return SchemaNode::Array {
                    items: Box::new(SchemaNode::from_value(items)),
                    keywords: without(object, &["items"]),
                };
            }
        }

        if type_is("object") {
            if let Some(Value::Object(properties)) = object.get("properties") {
                return SchemaNode::Object {
                    properties: properties
                        .iter()
                        .map(|(name, schema)| (name.clone(), SchemaNode::from_value(schema)))
                        .collect(),
                    keywords: without(object, &["properties"]),
                };
            }
        }

        let compositions: Vec<_> = CompositeKeyword::ALL
            .iter()
            .filter_map(|keyword| match object.get(keyword.as_str()) {
                Some(Value::Array(alternatives)) => Some((
                    *keyword,
                    alternatives.iter().map(SchemaNode::from_value).collect(),
                )),
                _ => None,
            })
            .collect();
        if !compositions.is_empty() {
            let names: Vec<&str> = compositions.iter().map(|(k, _)| k.as_str()).collect();
            return SchemaNode::Composite {
                keywords: without(object, &names),
                compositions,
            };
        }

        SchemaNode::Leaf(value.clone())
    }

    /// Model name of a reference in `#/definitions/` or `#/components/schemas/` form.
    pub fn reference_name(target: &str) -> Option<&str> {
        target
            .strip_prefix("#/definitions/")
            .or_else(|| target.strip_prefix("#/components/schemas/"))
            .filter(|name| !name.is_empty())
    }
}

fn without(object: &Keywords, keys: &[&str]) -> Keywords {
    object
        .iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
