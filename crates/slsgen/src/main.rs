//! slsgen: Serverless configuration generator for Ts.ED controllers.
//!
//! Reads a `serverless.yml`, scans the controllers registered by the
//! project's entry files and writes the configuration back with generated
//! functions and API Gateway models.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use slsgen_annotations::{discover, extract};
use slsgen_compiler::{
    function_name, generate, load_document, rewrite_path, CommandGenerator, ExistingDocument,
    GenerateError, GenerateOutcome, GenerateRequest, ServiceConfig,
};
use slsgen_telemetry::{
    init_logging, log_function_collision, log_run_completed, log_run_failed, log_run_started,
    LogFormat, TelemetryConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "slsgen",
    about = "Generate Serverless functions and API Gateway models from Ts.ED controllers",
    version
)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, env = "SLSGEN_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, env = "SLSGEN_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate functions and models and merge them into the configuration.
    Generate {
        /// Service configuration file.
        #[arg(short, long, default_value = "serverless.yml")]
        config: PathBuf,

        /// Project root (default: the configuration file's directory).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Write the merged configuration here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Attach bare request schemas for serverless-offline.
        #[arg(long)]
        offline: bool,

        /// Use the API description document already on disk.
        #[arg(long)]
        skip_generate: bool,
    },

    /// Print the controllers, routes and annotations found from entry files.
    Routes {
        /// Entry file(s).
        #[arg(short, long, required = true, num_args = 1..)]
        entry: Vec<PathBuf>,
    },

    /// Print the resolved JSON schema of one model.
    Schema {
        /// API description document (swagger.json).
        #[arg(short, long)]
        document: PathBuf,

        /// Model name.
        #[arg(short, long)]
        model: String,
    },
}

/// Run the generate command.
async fn run_generate(
    config: &Path,
    root: Option<&Path>,
    output: Option<&Path>,
    offline: bool,
    skip_generate: bool,
) -> ExitCode {
    let service = match ServiceConfig::load(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let root = match root {
        Some(r) => r.to_path_buf(),
        None => match config.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };

    log_run_started!(config = %config.display(), root = %root.display(), offline, skip_generate);

    let request = GenerateRequest {
        root,
        service,
        offline,
    };
    let result = if skip_generate {
        generate(request, &ExistingDocument).await
    } else {
        generate(request, &CommandGenerator).await
    };

    let outcome = match result {
        Ok(o) => o,
        Err(e) => {
            log_run_failed!(error = %e);
            eprintln!("error: generation failed: {}", e);
            return ExitCode::from(1);
        }
    };

    for key in &outcome.collisions {
        log_function_collision!(function = %key, "later route replaced an earlier one");
        eprintln!("warning: function '{}' is generated by more than one route", key);
    }

    if let Err(e) = write_output(&outcome, output) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    log_run_completed!(functions = outcome.functions, models = outcome.models);
    eprintln!(
        "generated {} function(s) and {} model(s) from {} controller(s) in {} entry file(s)",
        outcome.functions, outcome.models, outcome.controllers, outcome.entry_files
    );
    ExitCode::SUCCESS
}

fn write_output(outcome: &GenerateOutcome, output: Option<&Path>) -> Result<(), GenerateError> {
    let yaml = outcome.service.to_yaml()?;
    match output {
        Some(path) => std::fs::write(path, yaml)?,
        None => print!("{}", yaml),
    }
    Ok(())
}

/// Run the routes command.
fn run_routes(entries: &[PathBuf]) -> ExitCode {
    let controllers = match discover(entries) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let report: Vec<Value> = controllers
        .iter()
        .map(|controller| {
            let descriptor = &controller.descriptor;
            let routes: Vec<Value> = descriptor
                .routes
                .iter()
                .map(|route| {
                    json!({
                        "method": route.method_key,
                        "verb": route.verb,
                        "path": rewrite_path(&format!("{}{}", descriptor.base_path, route.path_template)),
                        "function": function_name(
                            route.verb.as_str(),
                            &descriptor.base_path,
                            &route.path_template,
                        ),
                        "annotations": extract(&route.method_key, &controller.class),
                    })
                })
                .collect();
            json!({
                "entry": controller.entry_file,
                "source": controller.source_path,
                "class": descriptor.class_name,
                "basePath": descriptor.base_path,
                "routes": routes,
            })
        })
        .collect();

    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{}", text);
            eprintln!("found {} controller(s)", controllers.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the schema command.
fn run_schema(document: &Path, model: &str) -> ExitCode {
    let graph = match load_document(document) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    match slsgen_schema::resolve(model, &graph) {
        Ok(Some(resolved)) => match serde_json::to_string_pretty(&resolved.to_document()) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::from(1)
            }
        },
        Ok(None) => {
            eprintln!(
                "error: model '{}' not found in {}",
                model,
                document.display()
            );
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: invalid log format '{}' (expected json or pretty)", cli.log_format);
        return ExitCode::from(2);
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level)
        .with_log_format(log_format);
    if let Err(e) = init_logging(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    match cli.command {
        Commands::Generate {
            config,
            root,
            output,
            offline,
            skip_generate,
        } => {
            run_generate(
                &config,
                root.as_deref(),
                output.as_deref(),
                offline,
                skip_generate,
            )
            .await
        }
        Commands::Routes { entry } => run_routes(&entry),
        Commands::Schema { document, model } => run_schema(&document, &model),
    }
}
