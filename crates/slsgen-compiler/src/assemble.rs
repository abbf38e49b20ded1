//! Per-route function descriptors.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use slsgen_annotations::{AnnotationTable, ControllerDescriptor, HttpVerb, RouteMethod};
use slsgen_schema::{ResolveError, SchemaCache, SchemaGraph};

use crate::naming::{capitalize, deployed_name, function_name, handler_path, rewrite_path};
use crate::options::PluginOptions;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Response model used when none is declared or resolvable.
pub const EMPTY_RESPONSE_MODEL: &str = "Empty";

/// Identity validation applied to bearer tokens by the request authorizer.
pub const BEARER_TOKEN_EXPRESSION: &str =
    r"^Bearer [A-Za-z0-9-_]+\.([A-Za-z0-9-_]+)?\.([A-Za-z0-9-_]+)?$";

const BODY_ANNOTATION: &str = "BodyParams";
const QUERY_ANNOTATION: &str = "QueryParams";
const PATH_ANNOTATION: &str = "PathParams";
const RESPONSE_ANNOTATION: &str = "Returns";
const SUMMARY_ANNOTATION: &str = "Summary";
const DESCRIPTION_ANNOTATION: &str = "Description";
const LOCATION_ANNOTATION: &str = "In";
const LOCATION_NAME_CHILD: &str = "Name";

/// A Serverless function entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub name: String,
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<serde_yaml::Value>,
    pub events: Vec<FunctionEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionEvent {
    pub http: HttpEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpEvent {
    pub path: String,
    pub method: HttpVerb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<Authorizer>,
    pub request: RequestSchemas,
    pub documentation: Documentation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorizer {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub identity_validation_expression: String,
    pub identity_source: String,
}

/// Request body schemas keyed by content type; empty when no body is declared.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RequestSchemas {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub method_responses: Vec<MethodResponse>,
    pub query_params: Vec<ParameterDoc>,
    pub path_params: Vec<ParameterDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResponse {
    /// A number when the declared status is numeric.
    pub status_code: Value,
    pub response_models: ResponseModels,
    pub response_parameters: ResponseParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseModels {
    #[serde(rename = "application/json")]
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseParameters {
    #[serde(rename = "method.response.header.Content-Type")]
    pub content_type: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDoc {
    pub name: String,
    pub required: bool,
    pub schema: ParameterSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// Inputs shared by every route of one run.
pub struct AssemblyContext<'a> {
    pub service: &'a str,
    pub stage: &'a str,
    /// Project root; handler paths are relative to it.
    pub root: &'a Path,
    pub options: &'a PluginOptions,
    pub graph: &'a SchemaGraph,
    /// Attach bare request schemas, as the offline emulator expects.
    pub offline: bool,
}

/// A descriptor together with its function key.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFunction {
    pub key: String,
    pub descriptor: FunctionDescriptor,
}

/// Build the function descriptor of one route.
pub fn assemble(
    context: &AssemblyContext<'_>,
    cache: &mut SchemaCache,
    entry_file: &Path,
    controller: &ControllerDescriptor,
    route: &RouteMethod,
    annotations: &AnnotationTable,
) -> Result<AssembledFunction, ResolveError> {
    let verb = route.verb;
    let key = function_name(verb.as_str(), &controller.base_path, &route.path_template);
    let path = rewrite_path(&format!("{}{}", controller.base_path, route.path_template));

    let documentation = Documentation {
        summary: first_text(annotations, SUMMARY_ANNOTATION),
        description: first_text(annotations, DESCRIPTION_ANNOTATION),
        method_responses: responses(context, cache, verb, annotations)?,
        query_params: parameters(context, &path, verb, annotations, QUERY_ANNOTATION, "query"),
        path_params: parameters(context, &path, verb, annotations, PATH_ANNOTATION, "path"),
    };

    let descriptor = FunctionDescriptor {
        name: deployed_name(context.service, context.stage, &key),
        handler: handler_path(entry_file, context.root, &route.method_key),
        environment: context.options.environment.clone(),
        memory_size: context.options.memory_size.clone(),
        events: vec![FunctionEvent {
            http: HttpEvent {
                path,
                method: verb,
                cors: context.options.cors().cloned(),
                authorizer: authorizer(context.options, annotations),
                request: request_schemas(context, cache, verb, annotations)?,
                documentation,
            },
        }],
    };

    Ok(AssembledFunction { key, descriptor })
}

/// Default success status when no response is declared.
pub fn default_status(verb: HttpVerb) -> u16 {
    match verb {
        HttpVerb::Post => 201,
        _ => 200,
    }
}

fn request_schemas(
    context: &AssemblyContext<'_>,
    cache: &mut SchemaCache,
    verb: HttpVerb,
    annotations: &AnnotationTable,
) -> Result<RequestSchemas, ResolveError> {
    let mut selected = None;
    for occurrence in annotations.get(BODY_ANNOTATION) {
        let Some(binding) = occurrence.parameter() else {
            continue;
        };
        match cache.resolve(&binding.type_name, context.graph)? {
            Some(resolved) => selected = Some((binding.type_name.clone(), resolved.to_document())),
            None => tracing::debug!(model = %binding.type_name, "request body type has no schema"),
        }
    }

    let Some((type_name, schema)) = selected else {
        return Ok(RequestSchemas::default());
    };
    let entry = if context.offline {
        schema
    } else {
        serde_json::json!({
            "schema": schema,
            "name": format!("{}{}", capitalize(verb.as_str()), type_name),
        })
    };
    let mut schemas = Map::new();
    schemas.insert(JSON_CONTENT_TYPE.to_string(), entry);
    Ok(RequestSchemas {
        schemas: Some(schemas),
    })
}

fn parameters(
    context: &AssemblyContext<'_>,
    path: &str,
    verb: HttpVerb,
    annotations: &AnnotationTable,
    annotation: &str,
    location: &str,
) -> Vec<ParameterDoc> {
    annotations
        .get(annotation)
        .iter()
        .filter_map(|occurrence| occurrence.parameter())
        .filter_map(|binding| {
            let found = context
                .graph
                .find_parameter(path, verb.as_str(), location, &binding.name);
            if found.is_none() {
                tracing::debug!(
                    path,
                    parameter = %binding.name,
                    location,
                    "parameter not in API description, omitted"
                );
            }
            found
        })
        .map(|parameter| ParameterDoc {
            name: parameter.name,
            required: parameter.required,
            schema: ParameterSchema {
                type_name: parameter.type_name,
            },
        })
        .collect()
}

fn responses(
    context: &AssemblyContext<'_>,
    cache: &mut SchemaCache,
    verb: HttpVerb,
    annotations: &AnnotationTable,
) -> Result<Vec<MethodResponse>, ResolveError> {
    let declared = annotations.get(RESPONSE_ANNOTATION);
    if declared.is_empty() {
        return Ok(vec![method_response(
            Value::from(default_status(verb)),
            EMPTY_RESPONSE_MODEL.to_string(),
        )]);
    }

    let mut responses = Vec::with_capacity(declared.len());
    for occurrence in declared {
        let status = match occurrence.text(0).map(|s| unquote(&s).to_string()) {
            Some(text) => match text.parse::<u16>() {
                Ok(code) => Value::from(code),
                Err(_) => Value::String(text),
            },
            None => Value::from(default_status(verb)),
        };
        let model = match occurrence.text(1) {
            Some(text) => {
                let name = unquote(&text).to_string();
                if cache.resolve(&name, context.graph)?.is_some() {
                    name
                } else {
                    EMPTY_RESPONSE_MODEL.to_string()
                }
            }
            None => EMPTY_RESPONSE_MODEL.to_string(),
        };
        responses.push(method_response(status, model));
    }
    Ok(responses)
}

fn method_response(status_code: Value, model: String) -> MethodResponse {
    MethodResponse {
        status_code,
        response_models: ResponseModels { json: model },
        response_parameters: ResponseParameters { content_type: true },
    }
}

/// Attach the request authorizer when a header `In` annotation names the configured header.
fn authorizer(options: &PluginOptions, annotations: &AnnotationTable) -> Option<Authorizer> {
    let config = options.authorizer()?;
    let matched = annotations.get(LOCATION_ANNOTATION).iter().any(|occurrence| {
        let in_header = occurrence
            .text(0)
            .is_some_and(|location| location.to_lowercase().contains("header"));
        in_header
            && occurrence
                .child(LOCATION_NAME_CHILD)
                .and_then(|name| name.text(0))
                .is_some_and(|name| name.eq_ignore_ascii_case(&config.header_name))
    });
    matched.then(|| Authorizer {
        name: config.function_name.clone(),
        kind: "REQUEST".to_string(),
        identity_validation_expression: BEARER_TOKEN_EXPRESSION.to_string(),
        identity_source: format!("method.request.header.{}", config.header_name),
    })
}

fn first_text(annotations: &AnnotationTable, name: &str) -> Option<String> {
    annotations
        .first(name)
        .and_then(|occurrence| occurrence.text(0))
        .map(|text| unquote(&text).to_string())
}

/// Trim one pair of matching surrounding quotes left by the comma-split fallback.
fn unquote(text: &str) -> &str {
    for quote in ['\'', '"', '`'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}
