//! Folding generated entries into the service configuration.

use serde_yaml::{Mapping, Value};

use crate::error::GenerateError;
use crate::models::GeneratedModels;

/// Merge generated functions and models into `config`.
///
/// Entries already present in the configuration are kept as written.
/// Missing containers are created.
pub fn merge(
    config: &mut Value,
    functions: Mapping,
    models: GeneratedModels,
) -> Result<(), GenerateError> {
    let api_models = to_mapping(models.api_models)?;
    let documentation_models = to_mapping(models.documentation_models)?;

    let mut merged = config.clone();
    let root = as_mapping(&mut merged, "configuration root")?;

    merge_into(container(root, "functions")?, functions);

    let resources = container(root, "resources")?;
    merge_into(container(resources, "Resources")?, api_models);

    let custom = container(root, "custom")?;
    merge_into(container(custom, "documentation")?, documentation_models);

    *config = merged;
    Ok(())
}

fn to_mapping(
    entries: serde_json::Map<String, serde_json::Value>,
) -> Result<Mapping, GenerateError> {
    let mut mapping = Mapping::new();
    for (key, value) in entries {
        mapping.insert(Value::String(key), serde_yaml::to_value(value)?);
    }
    Ok(mapping)
}

fn merge_into(target: &mut Mapping, generated: Mapping) {
    let external = std::mem::take(target);
    *target = merge_maps(generated, external);
}

/// Generated keys first, in order, replaced by the external value on
/// collision; then external-only keys in their existing order.
fn merge_maps(generated: Mapping, external: Mapping) -> Mapping {
    let mut merged = Mapping::new();
    for (key, value) in generated {
        let value = match external.get(&key) {
            Some(existing) => {
                tracing::debug!(key = ?key, "keeping existing entry");
                existing.clone()
            }
            None => value,
        };
        merged.insert(key, value);
    }
    for (key, value) in external {
        if !merged.contains_key(&key) {
            merged.insert(key, value);
        }
    }
    merged
}

fn as_mapping<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Mapping, GenerateError> {
    if value.is_null() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => Ok(map),
        _ => Err(GenerateError::InvalidServiceConfig(format!(
            "'{what}' is not a mapping"
        ))),
    }
}

/// The child mapping under `key`, created when absent or null.
fn container<'a>(parent: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping, GenerateError> {
    if !parent.contains_key(key) {
        parent.insert(Value::String(key.to_string()), Value::Mapping(Mapping::new()));
    }
    match parent.get_mut(key) {
        Some(child) => as_mapping(child, key),
        None => Err(GenerateError::InvalidServiceConfig(format!(
            "'{key}' is missing"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn yaml(value: serde_json::Value) -> Value {
        serde_yaml::to_value(value).unwrap()
    }

    fn mapping(value: serde_json::Value) -> Mapping {
        match yaml(value) {
            Value::Mapping(map) => map,
            _ => panic!("not a mapping"),
        }
    }

    fn keys(value: &Value) -> Vec<String> {
        value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect()
    }

    fn models() -> GeneratedModels {
        GeneratedModels {
            api_models: object(json!({"EmptyModel": {"Type": "generated"}, "AModel": {"Type": "generated"}})),
            documentation_models: object(json!({"EmptyModel": {"name": "generated"}})),
        }
    }

    #[test]
    fn existing_entries_win() {
        let mut config = yaml(json!({
            "service": "api",
            "functions": {"get-foo": {"handler": "X"}, "manual": {"handler": "M"}}
        }));
        let functions = mapping(json!({
            "get-foo": {"handler": "generated"},
            "post-foo": {"handler": "generated"}
        }));
        merge(&mut config, functions, models()).unwrap();

        assert_eq!(config["functions"]["get-foo"]["handler"].as_str(), Some("X"));
        assert_eq!(keys(&config["functions"]), vec!["get-foo", "post-foo", "manual"]);
    }

    #[test]
    fn containers_are_created() {
        let mut config = yaml(json!({"service": "api"}));
        merge(&mut config, Mapping::new(), models()).unwrap();
        assert_eq!(config["functions"], Value::Mapping(Mapping::new()));
        assert_eq!(
            config["resources"]["Resources"]["AModel"]["Type"].as_str(),
            Some("generated")
        );
        assert_eq!(
            config["custom"]["documentation"]["EmptyModel"]["name"].as_str(),
            Some("generated")
        );
    }

    #[test]
    fn existing_models_and_siblings_survive() {
        let mut config = yaml(json!({
            "functions": null,
            "resources": {"Outputs": {"x": 1}, "Resources": {"AModel": {"Type": "manual"}}},
            "custom": {"tsedPlugin": {}, "documentation": {"EmptyModel": {"name": "manual"}}}
        }));
        merge(&mut config, Mapping::new(), models()).unwrap();
        assert_eq!(config["resources"]["Outputs"]["x"].as_i64(), Some(1));
        assert_eq!(config["resources"]["Resources"]["AModel"]["Type"].as_str(), Some("manual"));
        assert_eq!(
            config["resources"]["Resources"]["EmptyModel"]["Type"].as_str(),
            Some("generated")
        );
        assert_eq!(
            config["custom"]["documentation"]["EmptyModel"]["name"].as_str(),
            Some("manual")
        );
        assert!(config["custom"].get("tsedPlugin").is_some());
        assert_eq!(keys(&config), vec!["functions", "resources", "custom"]);
    }

    #[test]
    fn tagged_values_survive_the_merge() {
        let mut config: Value = serde_yaml::from_str(
            r#"
functions:
  get-foo:
    handler: manual.handler
    environment:
      TABLE: !Ref Table
resources:
  Resources:
    AModel:
      Properties:
        RestApiId: !Ref ApiGatewayRestApi
  Outputs:
    TableArn:
      Value: !GetAtt Table.Arn
"#,
        )
        .unwrap();
        let functions = mapping(json!({
            "get-foo": {"handler": "generated"},
            "post-foo": {"handler": "generated"}
        }));
        merge(&mut config, functions, models()).unwrap();

        assert!(matches!(
            config["functions"]["get-foo"]["environment"]["TABLE"],
            Value::Tagged(_)
        ));
        assert!(matches!(
            config["resources"]["Resources"]["AModel"]["Properties"]["RestApiId"],
            Value::Tagged(_)
        ));
        assert_eq!(
            config["resources"]["Resources"]["EmptyModel"]["Type"].as_str(),
            Some("generated")
        );

        let written = serde_yaml::to_string(&config).unwrap();
        assert!(written.contains("!Ref Table"), "{written}");
        assert!(written.contains("!Ref ApiGatewayRestApi"), "{written}");
        assert!(written.contains("!GetAtt Table.Arn"), "{written}");
    }

    #[test]
    fn non_mapping_container_is_rejected() {
        let mut config = yaml(json!({"functions": ["a"]}));
        let err = merge(&mut config, Mapping::new(), models()).unwrap_err();
        assert!(err.to_string().starts_with("E2006"));
        assert!(err.to_string().contains("'functions'"));
        assert_eq!(config, yaml(json!({"functions": ["a"]})));
    }
}
