//! The `serverless.yml` service configuration.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::GenerateError;

pub const DEFAULT_STAGE: &str = "dev";

/// A deployment configuration held as a YAML value tree.
///
/// Tagged nodes such as `!Ref` or `!GetAtt` are kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    value: Value,
}

impl ServiceConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GenerateError::InvalidServiceConfig(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&content, path)
    }

    /// Parse a configuration from YAML content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, GenerateError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            GenerateError::InvalidServiceConfig(format!("failed to parse {}: {}", path.display(), e))
        })?;
        match value {
            Value::Mapping(_) => Ok(Self { value }),
            Value::Null => Ok(Self {
                value: Value::Mapping(Mapping::new()),
            }),
            _ => Err(GenerateError::InvalidServiceConfig(format!(
                "{} is not a mapping",
                path.display()
            ))),
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// `service`, written either as a string or as `{name: ...}`.
    pub fn service_name(&self) -> Result<&str, GenerateError> {
        let service = self.value.get("service");
        service
            .and_then(Value::as_str)
            .or_else(|| service.and_then(|s| s.get("name")).and_then(Value::as_str))
            .ok_or_else(|| {
                GenerateError::InvalidServiceConfig("missing 'service' name".to_string())
            })
    }

    /// `provider.stage`, defaulting to `dev`.
    pub fn stage(&self) -> &str {
        self.value
            .get("provider")
            .and_then(|p| p.get("stage"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STAGE)
    }

    pub fn to_yaml(&self) -> Result<String, GenerateError> {
        Ok(serde_yaml::to_string(&self.value)?)
    }
}
