//! API Gateway models generated from the schema graph.

use serde_json::{json, Map, Value};

use slsgen_schema::{ResolveError, SchemaCache, SchemaGraph};

use crate::assemble::JSON_CONTENT_TYPE;

pub const GATEWAY_MODEL_TYPE: &str = "AWS::ApiGateway::Model";
pub const REST_API_REF: &str = "ApiGatewayRestApi";
pub const EMPTY_MODEL: &str = "EmptyModel";

/// Gateway models for `resources.Resources` and documentation models for
/// `custom.documentation`, keyed by `<Name>Model`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedModels {
    pub api_models: Map<String, Value>,
    pub documentation_models: Map<String, Value>,
}

impl GeneratedModels {
    pub fn len(&self) -> usize {
        self.api_models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.api_models.is_empty()
    }

    fn insert(&mut self, key: String, name: &str, schema: Value) {
        self.api_models.insert(
            key.clone(),
            json!({
                "Type": GATEWAY_MODEL_TYPE,
                "Properties": {
                    "RestApiId": { "Ref": REST_API_REF },
                    "ContentType": JSON_CONTENT_TYPE,
                    "Name": name,
                    "Schema": schema.clone(),
                }
            }),
        );
        self.documentation_models.insert(
            key,
            json!({
                "contentType": JSON_CONTENT_TYPE,
                "name": name,
                "schema": schema,
            }),
        );
    }
}

/// Resource key of a model.
pub fn model_key(name: &str) -> String {
    format!("{name}Model")
}

/// `EmptyModel` plus one model per resolvable schema in the document.
pub fn generate_models(
    graph: &SchemaGraph,
    cache: &mut SchemaCache,
) -> Result<GeneratedModels, ResolveError> {
    let mut models = GeneratedModels::default();
    models.insert(
        EMPTY_MODEL.to_string(),
        EMPTY_MODEL,
        json!({ "type": "object", "properties": {} }),
    );

    for name in graph.schema_names() {
        match cache.resolve(name, graph)? {
            Some(resolved) => models.insert(model_key(name), name, resolved.to_document()),
            None => tracing::debug!(model = %name, "schema did not resolve, no model generated"),
        }
    }

    tracing::debug!(models = models.len(), "generated gateway models");
    Ok(models)
}
