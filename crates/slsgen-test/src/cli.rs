//! CLI regression tests for the `slsgen` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats.
//!
//! Run with: `cargo test -p slsgen-test`
//! Requires the `slsgen` binary to be built first (`cargo build -p slsgen`).

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

use crate::project::{fixtures_dir, FixtureProject};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `slsgen` binary.
fn slsgen() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("slsgen").expect("slsgen binary not found, run `cargo build -p slsgen` first")
}

/// Run `generate --skip-generate` on the fixture project and parse the output.
fn generate_fixture(extra: &[&str]) -> Value {
    let out = TempDir::new().unwrap();
    let output = out.path().join("serverless.out.yml");
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(fixtures_dir().join("crud-project/serverless.yml"))
        .arg("--output")
        .arg(&output)
        .args(extra)
        .assert()
        .success();
    let content = std::fs::read_to_string(&output).unwrap();
    serde_yaml::from_str(&content).unwrap()
}

fn keys(value: &Value) -> Vec<String> {
    value.as_object().unwrap().keys().cloned().collect()
}

// ---------------------------------------------------------------------------
// slsgen generate
// ---------------------------------------------------------------------------

#[test]
fn generate_reports_summary() {
    let out = TempDir::new().unwrap();
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(fixtures_dir().join("crud-project/serverless.yml"))
        .arg("--output")
        .arg(out.path().join("out.yml"))
        .assert()
        .success()
        .stderr(contains("generated 3 function(s)"));
}

#[test]
fn generate_merges_functions_with_existing_first() {
    let config = generate_fixture(&[]);
    let functions = &config["functions"];
    assert_eq!(
        keys(functions),
        vec!["post-crud", "get-crud-id", "get-cruds", "authorizer"]
    );
    assert_eq!(functions["get-crud-id"]["handler"], "src/custom/get-crud.handler");
    assert_eq!(
        functions["authorizer"]["handler"],
        "src/modules/auth/authorizer/authorizer-module.handler"
    );
}

#[test]
fn generate_builds_function_descriptor() {
    let config = generate_fixture(&[]);
    let create = &config["functions"]["post-crud"];
    assert_eq!(create["name"], "crud-api-dev-post-crud");
    assert_eq!(
        create["handler"],
        "src/modules/crud/create/create-crud-module.handler"
    );
    assert_eq!(create["memorySize"], 256);
    assert_eq!(create["environment"]["NODE_ENV"], "production");

    let http = &create["events"][0]["http"];
    assert_eq!(http["path"], "/crud/");
    assert_eq!(http["method"], "post");
    assert_eq!(http["cors"], true);
    assert_eq!(http["authorizer"]["name"], "authorizer");
    assert_eq!(http["authorizer"]["type"], "REQUEST");
    assert_eq!(
        http["authorizer"]["identitySource"],
        "method.request.header.Authorization"
    );

    let body = &http["request"]["schemas"]["application/json"];
    assert_eq!(body["name"], "PostRequest");
    assert_eq!(
        body["schema"]["properties"]["previous"]["$ref"],
        "#/definitions/Request"
    );
    assert!(body["schema"]["properties"]["dateCreation"]
        .get("example")
        .is_none());

    let documentation = &http["documentation"];
    assert_eq!(documentation["summary"], "Create a row");
    let responses = documentation["methodResponses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["statusCode"], 200);
    assert_eq!(responses[0]["responseModels"]["application/json"], "Request");
    assert_eq!(responses[1]["statusCode"], 404);
    assert_eq!(responses[1]["responseModels"]["application/json"], "Response1");
}

#[test]
fn generate_documents_parameters_from_swagger() {
    let project = FixtureProject::copy("crud-project").unwrap();
    project
        .edit_config(|config| {
            config["functions"]
                .as_object_mut()
                .unwrap()
                .remove("get-crud-id");
        })
        .unwrap();
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(project.config())
        .arg("--output")
        .arg(project.root().join("out.yml"))
        .assert()
        .success();
    let config = project.read_yaml("out.yml").unwrap();

    let get = &config["functions"]["get-crud-id"]["events"][0]["http"];
    assert_eq!(get["path"], "/crud/{id}");
    let documentation = &get["documentation"];
    assert_eq!(documentation["pathParams"][0]["name"], "id");
    assert_eq!(documentation["pathParams"][0]["required"], true);
    assert_eq!(documentation["pathParams"][0]["schema"]["type"], "number");
    let query: Vec<_> = documentation["queryParams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(query, vec!["param", "param2"]);

    let list = &config["functions"]["get-cruds"]["events"][0]["http"];
    assert!(list.get("authorizer").is_none());
    assert_eq!(list["request"], serde_json::json!({}));
}

#[test]
fn generate_adds_gateway_models() {
    let config = generate_fixture(&[]);
    let resources = &config["resources"]["Resources"];
    assert_eq!(
        keys(resources),
        vec!["EmptyModel", "Response1Model", "RequestModel", "ResponseModel"]
    );
    assert_eq!(resources["RequestModel"]["Type"], "AWS::ApiGateway::Model");
    assert_eq!(resources["RequestModel"]["Properties"]["Name"], "Request");
    assert_eq!(
        config["custom"]["documentation"]["RequestModel"]["contentType"],
        "application/json"
    );
    assert_eq!(config["custom"]["tsedPlugin"]["memorySize"], 256);
}

#[test]
fn generate_offline_attaches_bare_schema() {
    let config = generate_fixture(&["--offline"]);
    let body = &config["functions"]["post-crud"]["events"][0]["http"]["request"]["schemas"]
        ["application/json"];
    assert_eq!(body["$schema"], "http://json-schema.org/draft-07/schema#");
    assert!(body.get("name").is_none());
}

#[test]
fn generate_writes_stdout_without_output() {
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(fixtures_dir().join("crud-project/serverless.yml"))
        .assert()
        .success()
        .stdout(contains("post-crud:"))
        .stdout(contains("RequestModel:"));
}

#[cfg(unix)]
#[test]
fn generate_keeps_intrinsic_function_tags() {
    let out = TempDir::new().unwrap();
    let output = out.path().join("serverless.out.yml");
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(fixtures_dir().join("tagged-config/serverless.yml"))
        .arg("--root")
        .arg(fixtures_dir().join("crud-project"))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("role: !GetAtt LambdaRole.Arn"), "{content}");
    assert!(content.contains("TABLE_NAME: !Ref CrudTable"), "{content}");
    assert!(content.contains("Value: !GetAtt CrudTable.Arn"), "{content}");
    assert!(content.contains("!Sub"), "{content}");
    assert!(content.contains("post-crud:"), "{content}");

    let config: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    assert!(matches!(
        config["resources"]["Outputs"]["CrudTableArn"]["Value"],
        serde_yaml::Value::Tagged(_)
    ));
    assert_eq!(
        config["functions"]["get-crud-id"]["handler"].as_str(),
        Some("src/custom/get-crud.handler")
    );
    assert!(config["resources"]["Resources"]["CrudTable"].is_mapping());
    assert!(config["resources"]["Resources"]["EmptyModel"].is_mapping());
}

#[test]
fn generate_runs_document_command() {
    let project = FixtureProject::copy("crud-project").unwrap();
    slsgen()
        .args(["generate", "--config"])
        .arg(project.config())
        .arg("--output")
        .arg(project.root().join("out.yml"))
        .assert()
        .success();
    assert!(project.root().join("out.yml").is_file());
}

#[cfg(unix)]
#[test]
fn generate_failing_document_command_exits_one() {
    let project = FixtureProject::copy("crud-project").unwrap();
    project
        .edit_config(|config| {
            config["custom"]["tsedPlugin"]["document"]["command"] =
                "echo 'cannot find module' >&2".into();
        })
        .unwrap();
    slsgen()
        .args(["generate", "--config"])
        .arg(project.config())
        .arg("--output")
        .arg(project.root().join("out.yml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2004"))
        .stderr(contains("cannot find module"));
    assert!(!project.root().join("out.yml").exists());
}

#[test]
fn generate_missing_document_exits_one() {
    let project = FixtureProject::copy("crud-project").unwrap();
    std::fs::remove_dir_all(project.root().join(".tsed")).unwrap();
    slsgen()
        .args(["generate", "--skip-generate", "--config"])
        .arg(project.config())
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2002"));
}

#[test]
fn generate_dotted_entry_file_exits_one() {
    slsgen()
        .args(["generate", "--config"])
        .arg(fixtures_dir().join("dotted-project/serverless.yml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"))
        .stderr(contains("app.module.ts"));
}

#[test]
fn generate_missing_config_exits_one() {
    slsgen()
        .args(["generate", "--config", "this-file-does-not-exist.yml"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("failed to read"));
}

#[test]
fn invalid_log_format_exits_two() {
    slsgen()
        .args(["--log-format", "xml", "generate", "--skip-generate", "--config"])
        .arg(fixtures_dir().join("crud-project/serverless.yml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("invalid log format"));
}

// ---------------------------------------------------------------------------
// slsgen routes
// ---------------------------------------------------------------------------

#[test]
fn routes_lists_controllers_and_annotations() {
    slsgen()
        .args(["routes", "--entry"])
        .arg(fixtures_dir().join("crud-project/src/modules/crud/create/create-crud-module.ts"))
        .assert()
        .success()
        .stdout(contains("CreateCrudController"))
        .stdout(contains("\"function\": \"post-crud\""))
        .stdout(contains("\"BodyParams\""))
        .stdout(contains("\"authorization\""));
}

#[test]
fn routes_dotted_entry_exits_one() {
    slsgen()
        .args(["routes", "--entry"])
        .arg(fixtures_dir().join("dotted-project/src/app/app.module.ts"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2001"));
}

#[test]
fn routes_missing_entry_exits_one() {
    slsgen()
        .args(["routes", "--entry", "missing-module.ts"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E1001"));
}

// ---------------------------------------------------------------------------
// slsgen schema
// ---------------------------------------------------------------------------

#[test]
fn schema_prints_resolved_model() {
    slsgen()
        .args(["schema", "--model", "Request", "--document"])
        .arg(fixtures_dir().join("crud-project/.tsed/swagger/api-docs/swagger.json"))
        .assert()
        .success()
        .stdout(contains("http://json-schema.org/draft-07/schema#"))
        .stdout(contains("#/definitions/Request"));
}

#[test]
fn schema_unknown_model_exits_one() {
    slsgen()
        .args(["schema", "--model", "Nope", "--document"])
        .arg(fixtures_dir().join("crud-project/.tsed/swagger/api-docs/swagger.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("model 'Nope' not found"));
}

#[test]
fn schema_multiple_alternatives_exits_one() {
    slsgen()
        .args(["schema", "--model", "Payment", "--document"])
        .arg(fixtures_dir().join("documents/multiple-alternatives.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("E2003"))
        .stderr(contains("Payment"));
}
