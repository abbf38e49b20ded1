//! Depth-first, memoized schema resolution.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::error::ResolveError;
use crate::graph::SchemaGraph;
use crate::node::{retain_supported, Keywords, SchemaNode};

/// JSON Schema dialect of rendered documents.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Keyword removed from every node.
const OPENAPI_KEYWORD: &str = "openapi";

/// A model with every reachable reference pulled into `definitions`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub name: String,
    pub root: Value,
    /// Referenced models, innermost first.
    pub definitions: Map<String, Value>,
}

impl ResolvedSchema {
    /// Render as a self-contained draft-07 document.
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("$schema".to_string(), json!(DRAFT_07));
        if let Value::Object(root) = &self.root {
            for (key, value) in root {
                document.insert(key.clone(), value.clone());
            }
        }
        let mut definitions = self.definitions.clone();
        definitions.insert(self.name.clone(), self.root.clone());
        document.insert("definitions".to_string(), Value::Object(definitions));
        Value::Object(document)
    }
}

/// State of one top-level resolution.
struct ResolutionContext<'g> {
    graph: &'g SchemaGraph,
    model: String,
    seen: HashSet<String>,
    definitions: Map<String, Value>,
}

/// Resolve a named model.
///
/// Returns `Ok(None)` when the name is in neither schema store. Unresolvable
/// references below the root are omitted from the output.
pub fn resolve(model: &str, graph: &SchemaGraph) -> Result<Option<ResolvedSchema>, ResolveError> {
    let Some(raw) = graph.schema(model) else {
        tracing::debug!(model, "model not found in document");
        return Ok(None);
    };

    let mut context = ResolutionContext {
        graph,
        model: model.to_string(),
        seen: HashSet::from([model.to_string()]),
        definitions: Map::new(),
    };
    let root = context.resolve(&SchemaNode::from_value(raw))?;

    Ok(root.map(|root| ResolvedSchema {
        name: model.to_string(),
        root,
        definitions: context.definitions,
    }))
}

impl ResolutionContext<'_> {
    fn resolve(&mut self, node: &SchemaNode) -> Result<Option<Value>, ResolveError> {
        match node {
            SchemaNode::Reference { target } => self.reference(target),

            SchemaNode::Array { items, keywords } => {
                let mut out = strip_openapi(keywords);
                match self.resolve(items)? {
                    Some(items) => {
                        out.insert("items".to_string(), items);
                    }
                    None => tracing::debug!(model = %self.model, "array items unresolvable, dropped"),
                }
                Ok(Some(Value::Object(out)))
            }

            SchemaNode::Object {
                properties,
                keywords,
            } => {
                let mut out = strip_openapi(keywords);
                if out.remove("nullable").is_some() {
                    tracing::warn!(
                        model = %self.model,
                        "nullable is not supported by the API gateway and was dropped; send undefined instead of null"
                    );
                }

                let mut resolved = Map::new();
                for (name, schema) in properties {
                    let Some(mut value) = self.resolve(schema)? else {
                        tracing::debug!(model = %self.model, property = %name, "property unresolvable, dropped");
                        continue;
                    };
                    if let Value::Object(keywords) = &mut value {
                        if keywords.contains_key("nullable") {
                            tracing::warn!(
                                model = %self.model,
                                property = %name,
                                "nullable on property is not supported by the API gateway and was dropped"
                            );
                        }
                        retain_supported(keywords);
                    }
                    resolved.insert(name.clone(), value);
                }
                out.insert("properties".to_string(), Value::Object(resolved));
                Ok(Some(Value::Object(out)))
            }

            SchemaNode::Composite {
                compositions,
                keywords,
            } => {
                let mut out = strip_openapi(keywords);
                for (keyword, alternatives) in compositions {
                    match alternatives.as_slice() {
                        [] => {
                            out.insert(keyword.as_str().to_string(), Value::Array(Vec::new()));
                        }
                        [single] => {
                            if let Some(Value::Object(merged)) = self.resolve(single)? {
                                out.extend(merged);
                            }
                        }
                        _ => {
                            return Err(ResolveError::MultipleAlternatives {
                                model: self.model.clone(),
                                keyword: keyword.as_str(),
                                count: alternatives.len(),
                            })
                        }
                    }
                }
                Ok(Some(Value::Object(out)))
            }

            SchemaNode::Leaf(value) => {
                let mut value = value.clone();
                if let Value::Object(keywords) = &mut value {
                    keywords.remove(OPENAPI_KEYWORD);
                }
                Ok(Some(value))
            }
        }
    }

    fn reference(&mut self, target: &str) -> Result<Option<Value>, ResolveError> {
        let graph = self.graph;
        let Some(name) = SchemaNode::reference_name(target) else {
            tracing::debug!(model = %self.model, reference = %target, "unsupported reference form");
            return Ok(None);
        };
        if self.seen.contains(name) {
            return Ok(Some(reference_to(name)));
        }
        let Some(raw) = graph.schema(name) else {
            tracing::debug!(model = %self.model, reference = %name, "unresolved reference");
            return Ok(None);
        };

        // Seed before recursing so cycles stop at this name.
        self.seen.insert(name.to_string());
        match self.resolve(&SchemaNode::from_value(raw))? {
            Some(resolved) => {
                self.definitions.insert(name.to_string(), resolved);
                Ok(Some(reference_to(name)))
            }
            None => {
                self.seen.remove(name);
                Ok(None)
            }
        }
    }
}

fn reference_to(name: &str) -> Value {
    json!({ "$ref": format!("#/definitions/{name}") })
}

fn strip_openapi(keywords: &Keywords) -> Keywords {
    let mut out = keywords.clone();
    out.remove(OPENAPI_KEYWORD);
    out
}

/// Resolved models memoized by name for one generation run.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<String, Option<ResolvedSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `model`, reusing an earlier result for the same name.
    pub fn resolve(
        &mut self,
        model: &str,
        graph: &SchemaGraph,
    ) -> Result<Option<&ResolvedSchema>, ResolveError> {
        if !self.entries.contains_key(model) {
            let resolved = resolve(model, graph)?;
            self.entries.insert(model.to_string(), resolved);
        }
        Ok(self.entries.get(model).and_then(Option::as_ref))
    }

    /// Number of names resolved so far, including misses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(document: Value) -> SchemaGraph {
        SchemaGraph::new(document)
    }

    /// Every `$ref` under `value`.
    fn references(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(target)) = map.get("$ref") {
                    out.push(target.clone());
                }
                map.values().for_each(|v| references(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| references(v, out)),
            _ => {}
        }
    }

    #[test]
    fn resolves_nested_references() {
        let graph = graph(json!({
            "definitions": {
                "User": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": {"type": "string", "example": "42"},
                        "address": {"$ref": "#/definitions/Address"},
                        "tags": {"type": "array", "items": {"$ref": "#/components/schemas/Tag"}}
                    }
                },
                "Address": {"type": "object", "properties": {"city": {"type": "string"}}}
            },
            "components": {"schemas": {"Tag": {"type": "string", "openapi": "3.0.0"}}}
        }));

        let resolved = resolve("User", &graph).unwrap().unwrap();
        assert_eq!(
            resolved.root,
            json!({
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": {"type": "string"},
                    "address": {"$ref": "#/definitions/Address"},
                    "tags": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                }
            })
        );
        assert_eq!(resolved.definitions.keys().collect::<Vec<_>>(), vec!["Address", "Tag"]);
        assert_eq!(resolved.definitions["Tag"], json!({"type": "string"}));
    }

    #[test]
    fn resolution_is_idempotent() {
        let graph = graph(json!({
            "definitions": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"type": "object", "properties": {"n": {"type": "number"}}}
            }
        }));
        let first = resolve("A", &graph).unwrap();
        let second = resolve("A", &graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mutual_cycle_terminates() {
        let graph = graph(json!({
            "definitions": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"type": "object", "properties": {"a": {"$ref": "#/definitions/A"}}}
            }
        }));
        let resolved = resolve("A", &graph).unwrap().unwrap();
        assert_eq!(
            resolved.definitions["B"],
            json!({"type": "object", "properties": {"a": {"$ref": "#/definitions/A"}}})
        );
        let document = resolved.to_document();
        let definitions = document["definitions"].as_object().unwrap();
        assert!(definitions.contains_key("A"));
        assert!(definitions.contains_key("B"));
    }

    #[test]
    fn self_reference_points_at_model() {
        let graph = graph(json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$ref": "#/definitions/Node"}}
                    }
                }
            }
        }));
        let resolved = resolve("Node", &graph).unwrap().unwrap();
        assert!(resolved.definitions.is_empty());
        assert_eq!(
            resolved.root["properties"]["children"]["items"],
            json!({"$ref": "#/definitions/Node"})
        );
    }

    #[test]
    fn output_is_self_contained() {
        let graph = graph(json!({
            "definitions": {
                "Order": {
                    "type": "object",
                    "properties": {
                        "customer": {"$ref": "#/definitions/Customer"},
                        "missing": {"$ref": "#/definitions/Nope"},
                        "external": {"$ref": "other.json#/Thing"},
                        "lines": {"type": "array", "items": {"$ref": "#/definitions/Line"}}
                    }
                },
                "Customer": {"type": "object", "properties": {"best": {"$ref": "#/definitions/Order"}}},
                "Line": {"allOf": [{"$ref": "#/definitions/Customer"}], "description": "line"}
            }
        }));
        for name in graph.schema_names() {
            let document = resolve(name, &graph).unwrap().unwrap().to_document();
            let definitions = document["definitions"].as_object().unwrap();
            let mut targets = Vec::new();
            references(&document, &mut targets);
            for target in targets {
                let key = target.strip_prefix("#/definitions/").unwrap();
                assert!(definitions.contains_key(key), "{name}: dangling {target}");
            }
        }
    }

    #[test]
    fn unresolvable_branches_are_omitted() {
        let graph = graph(json!({
            "definitions": {
                "A": {
                    "type": "object",
                    "properties": {
                        "gone": {"$ref": "#/definitions/Nope"},
                        "kept": {"type": "string"}
                    }
                },
                "L": {"type": "array", "items": {"$ref": "#/definitions/Nope"}}
            }
        }));
        let a = resolve("A", &graph).unwrap().unwrap();
        assert_eq!(a.root["properties"], json!({"kept": {"type": "string"}}));
        let l = resolve("L", &graph).unwrap().unwrap();
        assert_eq!(l.root, json!({"type": "array"}));
        assert!(resolve("Nope", &graph).unwrap().is_none());
    }

    #[test]
    fn single_alternative_is_merged() {
        let graph = graph(json!({
            "definitions": {
                "Wrapper": {"description": "outer", "oneOf": [{"type": "string", "description": "inner"}]}
            }
        }));
        let resolved = resolve("Wrapper", &graph).unwrap().unwrap();
        assert_eq!(resolved.root, json!({"description": "inner", "type": "string"}));
    }

    #[test]
    fn multiple_alternatives_are_rejected() {
        let graph = graph(json!({
            "definitions": {
                "Pet": {"anyOf": [{"type": "string"}, {"type": "number"}]}
            }
        }));
        let err = resolve("Pet", &graph).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MultipleAlternatives { count: 2, keyword: "anyOf", .. }
        ));
        assert!(err.to_string().starts_with("E2003"));
        assert!(err.to_string().contains("Pet"));
    }

    #[test]
    fn nullable_is_dropped() {
        let graph = graph(json!({
            "definitions": {
                "A": {
                    "type": "object",
                    "nullable": true,
                    "properties": {"name": {"type": "string", "nullable": true}}
                }
            }
        }));
        let resolved = resolve("A", &graph).unwrap().unwrap();
        assert_eq!(
            resolved.root,
            json!({"type": "object", "properties": {"name": {"type": "string"}}})
        );
    }

    #[test]
    fn draft_07_document() {
        let graph = graph(json!({
            "definitions": {
                "A": {"type": "object", "properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"type": "string"}
            }
        }));
        let document = resolve("A", &graph).unwrap().unwrap().to_document();
        assert_eq!(
            document,
            json!({
                "$schema": DRAFT_07,
                "type": "object",
                "properties": {"b": {"$ref": "#/definitions/B"}},
                "definitions": {
                    "B": {"type": "string"},
                    "A": {"type": "object", "properties": {"b": {"$ref": "#/definitions/B"}}}
                }
            })
        );
    }

    #[test]
    fn cache_reuses_results() {
        let graph = graph(json!({"definitions": {"A": {"type": "string"}}}));
        let mut cache = SchemaCache::new();
        assert!(cache.resolve("A", &graph).unwrap().is_some());
        assert!(cache.resolve("A", &graph).unwrap().is_some());
        assert!(cache.resolve("Missing", &graph).unwrap().is_none());
        assert_eq!(cache.len(), 2);
    }
}
