//! Read-only access to a raw API-description document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Swagger 2 or OpenAPI 3 document.
///
/// Named schemas are looked up in `definitions` first, then in
/// `components.schemas`.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    document: Value,
}

impl SchemaGraph {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// The raw schema registered under `name`.
    pub fn schema(&self, name: &str) -> Option<&Value> {
        self.definitions()
            .and_then(|d| d.get(name))
            .filter(|v| !v.is_null())
            .or_else(|| {
                self.component_schemas()
                    .and_then(|c| c.get(name))
                    .filter(|v| !v.is_null())
            })
    }

    /// Every schema name, `definitions` first, without duplicates.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let stores = [self.definitions(), self.component_schemas()];
        for store in stores.into_iter().flatten() {
            for name in store.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Parameters declared for `verb` on `path`. Malformed entries are skipped.
    pub fn parameters(&self, path: &str, verb: &str) -> Vec<ParameterSpec> {
        self.document
            .get("paths")
            .and_then(|p| p.get(path))
            .and_then(|p| p.get(verb))
            .and_then(|op| op.get("parameters"))
            .and_then(Value::as_array)
            .map(|parameters| {
                parameters
                    .iter()
                    .filter_map(|p| serde_json::from_value::<RawParameter>(p.clone()).ok())
                    .map(ParameterSpec::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The parameter with this location and name, if declared.
    pub fn find_parameter(
        &self,
        path: &str,
        verb: &str,
        location: &str,
        name: &str,
    ) -> Option<ParameterSpec> {
        self.parameters(path, verb)
            .into_iter()
            .find(|p| p.location == location && p.name == name)
    }

    fn definitions(&self) -> Option<&serde_json::Map<String, Value>> {
        self.document.get("definitions").and_then(Value::as_object)
    }

    fn component_schemas(&self) -> Option<&serde_json::Map<String, Value>> {
        self.document
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
    }
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    /// Swagger 2 `type`, or `schema.type` in OpenAPI 3.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    #[serde(rename = "type")]
    type_name: Option<String>,
    schema: Option<RawParameterSchema>,
}

#[derive(Deserialize)]
struct RawParameterSchema {
    #[serde(rename = "type")]
    type_name: Option<String>,
}

impl From<RawParameter> for ParameterSpec {
    fn from(raw: RawParameter) -> Self {
        let type_name = raw
            .type_name
            .or_else(|| raw.schema.and_then(|s| s.type_name));
        Self {
            name: raw.name,
            location: raw.location,
            required: raw.required,
            type_name,
        }
    }
}
