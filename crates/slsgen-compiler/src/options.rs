//! Plugin options read from `custom.tsedPlugin`.

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::GenerateError;

/// Key under `custom` holding the options.
pub const OPTIONS_KEY: &str = "tsedPlugin";

pub const DEFAULT_MODULE_PATTERN: &str = "**/*module.*";
pub const DEFAULT_CONTROLLER_PATTERN: &str = "**/*controller.*";
pub const DEFAULT_DOCUMENT_PATH: &str = ".tsed/swagger/api-docs/swagger.json";
pub const DEFAULT_DOCUMENT_COMMAND: &str =
    "ts-node -r tsconfig-paths/register generate-tsed-swagger.ts generate-swagger --output ./.tsed/swagger";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    #[serde(default)]
    pub patterns: PatternOptions,
    /// Copied onto every generated function.
    pub environment: Option<Value>,
    /// Copied onto every generated function.
    pub memory_size: Option<Value>,
    #[serde(default)]
    pub events: EventOptions,
    pub authorizer: Option<AuthorizerOptions>,
    #[serde(default)]
    pub document: DocumentOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternOptions {
    pub module: Option<Patterns>,
    pub controller: Option<Patterns>,
}

/// One glob or a list of globs.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Patterns::One(p) => vec![p.clone()],
            Patterns::Many(ps) => ps.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventOptions {
    #[serde(default)]
    pub http: HttpEventOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpEventOptions {
    pub cors: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizerOptions {
    #[serde(rename = "HeaderName", default)]
    pub header_name: String,
    #[serde(rename = "functionName", default)]
    pub function_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentOptions {
    pub path: Option<String>,
    pub command: Option<String>,
}

impl PluginOptions {
    /// Read options from a service configuration; absent options are defaults.
    pub fn from_service(service: &Value) -> Result<Self, GenerateError> {
        match service.get("custom").and_then(|c| c.get(OPTIONS_KEY)) {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(options) => serde_yaml::from_value(options.clone()).map_err(|e| {
                GenerateError::InvalidServiceConfig(format!("custom.{OPTIONS_KEY}: {e}"))
            }),
        }
    }

    pub fn module_patterns(&self) -> Vec<String> {
        patterns_or(&self.patterns.module, DEFAULT_MODULE_PATTERN)
    }

    pub fn controller_patterns(&self) -> Vec<String> {
        patterns_or(&self.patterns.controller, DEFAULT_CONTROLLER_PATTERN)
    }

    /// HTTP `cors` setting; falsy values mean none.
    pub fn cors(&self) -> Option<&Value> {
        self.events
            .http
            .cors
            .as_ref()
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
    }

    /// The authorizer, when a header name is configured.
    pub fn authorizer(&self) -> Option<&AuthorizerOptions> {
        self.authorizer
            .as_ref()
            .filter(|a| !a.header_name.is_empty())
    }

    pub fn document_path(&self) -> &str {
        self.document.path.as_deref().unwrap_or(DEFAULT_DOCUMENT_PATH)
    }

    pub fn document_command(&self) -> &str {
        self.document
            .command
            .as_deref()
            .unwrap_or(DEFAULT_DOCUMENT_COMMAND)
    }
}

fn patterns_or(patterns: &Option<Patterns>, default: &str) -> Vec<String> {
    match patterns.as_ref().map(Patterns::to_vec) {
        Some(list) if !list.is_empty() => list,
        _ => vec![default.to_string()],
    }
}
