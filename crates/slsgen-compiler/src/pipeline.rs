//! The generation run, from entry files to the merged configuration.

use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

use slsgen_annotations::{check_entry_files, discover, extract};
use slsgen_schema::SchemaCache;

use crate::assemble::{assemble, AssemblyContext};
use crate::document::{load_document, DocumentGenerator, GenerationRequest};
use crate::error::GenerateError;
use crate::files::find_files;
use crate::merge::merge;
use crate::models::generate_models;
use crate::options::PluginOptions;
use crate::service::ServiceConfig;

/// Inputs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Project root; patterns and the document path are relative to it.
    pub root: PathBuf,
    pub service: ServiceConfig,
    /// Attach bare request schemas for the offline emulator.
    pub offline: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The service configuration with generated entries merged in.
    pub service: ServiceConfig,
    pub entry_files: usize,
    pub controllers: usize,
    pub functions: usize,
    pub models: usize,
    /// Function keys generated more than once; the last route won.
    pub collisions: Vec<String>,
}

/// Run the generator.
///
/// Nothing is merged unless every step succeeds.
pub async fn generate<G: DocumentGenerator>(
    request: GenerateRequest,
    generator: &G,
) -> Result<GenerateOutcome, GenerateError> {
    let GenerateRequest {
        root,
        mut service,
        offline,
    } = request;

    let options = PluginOptions::from_service(service.value())?;
    let service_name = service.service_name()?.to_string();
    let stage = service.stage().to_string();

    let entry_files = find_files(&root, &options.module_patterns())?;
    check_entry_files(&entry_files)?;
    tracing::info!(entry_files = entry_files.len(), "found entry files");

    let document_path = root.join(options.document_path());
    let generation = GenerationRequest {
        root: root.clone(),
        controller_patterns: options.controller_patterns(),
        command: options.document_command().to_string(),
        document_path: document_path.clone(),
    };
    generator.generate(&generation).await?;

    let graph = load_document(&document_path)?;
    let mut cache = SchemaCache::new();
    let models = generate_models(&graph, &mut cache)?;

    let controllers = discover(&entry_files)?;
    let context = AssemblyContext {
        service: &service_name,
        stage: &stage,
        root: &root,
        options: &options,
        graph: &graph,
        offline,
    };

    let mut functions = Mapping::new();
    let mut collisions = Vec::new();
    for controller in &controllers {
        for route in &controller.descriptor.routes {
            let annotations = extract(&route.method_key, &controller.class);
            let assembled = assemble(
                &context,
                &mut cache,
                &controller.entry_file,
                &controller.descriptor,
                route,
                &annotations,
            )?;
            let descriptor = serde_yaml::to_value(&assembled.descriptor)?;
            if functions
                .insert(Value::String(assembled.key.clone()), descriptor)
                .is_some()
            {
                tracing::warn!(
                    function = %assembled.key,
                    controller = %controller.source_path.display(),
                    "function name generated twice, keeping the later route"
                );
                collisions.push(assembled.key);
            }
        }
    }

    let outcome_functions = functions.len();
    let outcome_models = models.len();
    merge(service.value_mut(), functions, models)?;

    tracing::info!(
        controllers = controllers.len(),
        functions = outcome_functions,
        models = outcome_models,
        "merged generated configuration"
    );

    Ok(GenerateOutcome {
        service,
        entry_files: entry_files.len(),
        controllers: controllers.len(),
        functions: outcome_functions,
        models: outcome_models,
        collisions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ExistingDocument;
    use serde_json::json;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn request(root: PathBuf, service: serde_json::Value, offline: bool) -> GenerateRequest {
        GenerateRequest {
            root,
            service: ServiceConfig::from_value(serde_yaml::to_value(service).unwrap()),
            offline,
        }
    }

    fn config(outcome: &GenerateOutcome) -> serde_json::Value {
        serde_json::to_value(outcome.service.value()).unwrap()
    }

    const MODULE: &str = r#"
import { PlatformServerless } from "@tsed/platform-serverless";
import { CrudController } from "./crud-controller";

export = PlatformServerless.bootstrap({ lambda: [CrudController] }).callbacks();
"#;

    const CONTROLLER: &str = r#"
import { Controller } from "@tsed/di";
import { BodyParams, PathParams } from "@tsed/platform-params";
import { Get, Post, Returns, Summary } from "@tsed/schema";

@Controller('/crud')
export class CrudController {
  @Post('/')
  @Summary('Create')
  @Returns(200, Item)
  async create(@BodyParams() body: Item) {}

  @Get('/:id')
  async get(@PathParams('id') id: number) {}

  @Get('/a-b')
  async first() {}

  @Get('/a/b')
  async second() {}
}
"#;

    fn swagger() -> serde_json::Value {
        json!({
            "definitions": {
                "Item": {"type": "object", "properties": {"name": {"type": "string"}}}
            },
            "paths": {
                "/crud/{id}": {
                    "get": {"parameters": [{"in": "path", "name": "id", "required": true, "type": "number"}]}
                }
            }
        })
    }

    fn project(module_name: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        let modules = dir.path().join("src/crud");
        fs::create_dir_all(&modules).unwrap();
        fs::write(modules.join(module_name), MODULE).unwrap();
        fs::write(modules.join("crud-controller.ts"), CONTROLLER).unwrap();
        dir
    }

    fn service() -> serde_json::Value {
        json!({
            "service": "crud",
            "provider": {"name": "aws", "stage": "test"},
            "functions": {"get-crud-id": {"handler": "manual.handler"}}
        })
    }

    /// Writes a fixed document, recording that it ran.
    struct CannedDocument {
        document: serde_json::Value,
        ran: AtomicBool,
    }

    impl CannedDocument {
        fn new(document: serde_json::Value) -> Self {
            Self {
                document,
                ran: AtomicBool::new(false),
            }
        }
    }

    impl DocumentGenerator for CannedDocument {
        async fn generate(&self, request: &GenerationRequest) -> Result<(), GenerateError> {
            self.ran.store(true, Ordering::SeqCst);
            if let Some(parent) = request.document_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&request.document_path, self.document.to_string())?;
            Ok(())
        }
    }

    struct FailingGenerator;

    impl DocumentGenerator for FailingGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<(), GenerateError> {
            Err(GenerateError::DocumentGeneration("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn end_to_end() {
        let dir = project("crud-module.ts");
        let generator = CannedDocument::new(swagger());
        let outcome = generate(
            request(dir.path().to_path_buf(), service(), false),
            &generator,
        )
        .await
        .unwrap();

        assert_eq!(outcome.entry_files, 1);
        assert_eq!(outcome.controllers, 1);
        assert_eq!(outcome.functions, 3);
        assert_eq!(outcome.models, 2);
        assert_eq!(outcome.collisions, vec!["get-crud-a-b"]);

        let config = config(&outcome);
        let functions = config["functions"].as_object().unwrap();
        let keys: Vec<_> = functions.keys().cloned().collect();
        assert_eq!(keys, vec!["post-crud", "get-crud-id", "get-crud-a-b"]);

        assert_eq!(functions["get-crud-id"], json!({"handler": "manual.handler"}));
        assert_eq!(functions["get-crud-a-b"]["handler"], "src/crud/crud-module.second");

        let create = &functions["post-crud"];
        assert_eq!(create["name"], "crud-test-post-crud");
        assert_eq!(create["handler"], "src/crud/crud-module.create");
        let http = &create["events"][0]["http"];
        assert_eq!(http["request"]["schemas"]["application/json"]["name"], "PostItem");
        assert_eq!(
            http["documentation"]["methodResponses"][0]["responseModels"]["application/json"],
            "Item"
        );

        assert!(config["resources"]["Resources"]["ItemModel"].is_object());
        assert!(config["custom"]["documentation"]["EmptyModel"].is_object());
    }

    #[tokio::test]
    async fn dotted_entry_file_aborts_before_generation() {
        let dir = project("crud.module.ts");
        let generator = CannedDocument::new(swagger());
        let err = generate(
            request(dir.path().to_path_buf(), service(), false),
            &generator,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("E2001"));
        assert!(!generator.ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn generator_failure_aborts() {
        let dir = project("crud-module.ts");
        let err = generate(
            request(dir.path().to_path_buf(), service(), false),
            &FailingGenerator,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("E2004"));
    }

    #[tokio::test]
    async fn missing_document_aborts() {
        let dir = project("crud-module.ts");
        let err = generate(
            request(dir.path().to_path_buf(), service(), false),
            &ExistingDocument,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GenerateError::DocumentMissing(_)));
    }

    #[tokio::test]
    async fn custom_patterns_and_document_path() {
        let dir = project("crud-module.ts");
        let mut service = service();
        service["custom"] = json!({
            "tsedPlugin": {
                "patterns": {"module": ["lib/**/*.ts"]},
                "document": {"path": "docs/api.json"}
            }
        });
        let generator = CannedDocument::new(swagger());
        let outcome = generate(request(dir.path().to_path_buf(), service, false), &generator)
            .await
            .unwrap();
        assert_eq!(outcome.entry_files, 0);
        assert_eq!(outcome.functions, 0);
        assert!(dir.path().join("docs/api.json").is_file());
        assert!(config(&outcome)["custom"]["tsedPlugin"].is_object());
    }

    #[tokio::test]
    async fn missing_service_name_is_rejected() {
        let dir = project("crud-module.ts");
        let generator = CannedDocument::new(swagger());
        let err = generate(
            request(dir.path().to_path_buf(), json!({"provider": {}}), false),
            &generator,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("E2006"));
        assert!(!generator.ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn multiple_alternatives_abort_the_run() {
        let dir = project("crud-module.ts");
        let mut document = swagger();
        document["definitions"]["Payment"] = json!({
            "anyOf": [
                {"type": "object", "properties": {"card": {"type": "string"}}},
                {"type": "object", "properties": {"iban": {"type": "string"}}}
            ]
        });
        let generator = CannedDocument::new(document);
        let err = generate(
            request(dir.path().to_path_buf(), service(), false),
            &generator,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("E2003"), "{err}");
        assert!(matches!(err, GenerateError::Resolve(_)));
        assert!(generator.ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn tagged_configuration_values_are_kept() {
        let dir = project("crud-module.ts");
        let content = r#"
service: crud
provider:
  name: aws
  stage: test
custom:
  tsedPlugin:
    environment:
      TABLE: !Ref Table
functions:
  get-crud-id:
    handler: manual.handler
    role: !GetAtt Role.Arn
resources:
  Outputs:
    TableName:
      Value: !Ref Table
"#;
        let service = ServiceConfig::parse(content, &dir.path().join("serverless.yml")).unwrap();
        let generator = CannedDocument::new(swagger());
        let outcome = generate(
            GenerateRequest {
                root: dir.path().to_path_buf(),
                service,
                offline: false,
            },
            &generator,
        )
        .await
        .unwrap();

        let config = outcome.service.value();
        assert!(matches!(
            config["functions"]["get-crud-id"]["role"],
            Value::Tagged(_)
        ));
        assert!(matches!(
            config["functions"]["post-crud"]["environment"]["TABLE"],
            Value::Tagged(_)
        ));
        let yaml = outcome.service.to_yaml().unwrap();
        assert!(yaml.contains("!GetAtt Role.Arn"), "{yaml}");
        assert!(yaml.contains("TABLE: !Ref Table"), "{yaml}");
        assert!(yaml.contains("Value: !Ref Table"), "{yaml}");
    }
}
