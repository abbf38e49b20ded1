//! Producing and loading the raw API description document.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use slsgen_schema::SchemaGraph;
use tokio::process::Command;

use crate::error::GenerateError;

/// Environment variable carrying the controller patterns to the generator.
pub const PATTERNS_ENV: &str = "CONTROLLERS_PATTERNS";

/// What a generator needs to produce the document.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub root: PathBuf,
    pub controller_patterns: Vec<String>,
    pub command: String,
    pub document_path: PathBuf,
}

impl GenerationRequest {
    /// Controller patterns joined to the project root, comma separated.
    pub fn patterns_env(&self) -> String {
        self.controller_patterns
            .iter()
            .map(|p| self.root.join(p).to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Produces the API description document on disk.
pub trait DocumentGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<(), GenerateError>> + Send;
}

/// Runs a shell command in the project root.
#[derive(Debug, Clone, Default)]
pub struct CommandGenerator;

impl DocumentGenerator for CommandGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GenerateError> {
        tracing::info!(command = %request.command, "generating API description");

        let mut command = shell(&request.command);
        let output = command
            .current_dir(&request.root)
            .env(PATTERNS_ENV, request.patterns_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GenerateError::DocumentGeneration(format!("{}: {e}", request.command)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(output = %stdout.trim(), "generator output");
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(GenerateError::DocumentGeneration(format!(
                "'{}' exited with {status}: {}",
                request.command,
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            return Err(GenerateError::DocumentGeneration(stderr.trim().to_string()));
        }
        Ok(())
    }
}

#[cfg(windows)]
fn shell(script: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(script);
    command
}

#[cfg(not(windows))]
fn shell(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(script);
    command
}

/// Uses whatever document is already on disk.
#[derive(Debug, Clone, Default)]
pub struct ExistingDocument;

impl DocumentGenerator for ExistingDocument {
    async fn generate(&self, request: &GenerationRequest) -> Result<(), GenerateError> {
        tracing::debug!(path = %request.document_path.display(), "skipping document generation");
        Ok(())
    }
}

/// Load the document as a schema graph.
pub fn load_document(path: &Path) -> Result<SchemaGraph, GenerateError> {
    if !path.is_file() {
        return Err(GenerateError::DocumentMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let document = serde_json::from_str(&content).map_err(|source| GenerateError::DocumentInvalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SchemaGraph::new(document))
}
