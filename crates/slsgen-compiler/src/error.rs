use std::path::PathBuf;

use thiserror::Error;

/// Errors produced during generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Source scanning failed (E1001, E1002, E2001).
    #[error(transparent)]
    Scan(#[from] slsgen_annotations::ScanError),

    /// Schema resolution failed (E2003).
    #[error(transparent)]
    Resolve(#[from] slsgen_schema::ResolveError),

    /// E2002: The API description document was not produced.
    #[error("E2002: API description document not found at {}", .0.display())]
    DocumentMissing(PathBuf),

    /// E2004: The document generator failed.
    #[error("E2004: API description generation failed: {0}")]
    DocumentGeneration(String),

    /// E2005: The API description document is not valid JSON.
    #[error("E2005: API description document {} is not valid JSON: {source}", path.display())]
    DocumentInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// E2006: The service configuration is not usable.
    #[error("E2006: invalid service configuration: {0}")]
    InvalidServiceConfig(String),

    /// E2007: A file pattern could not be compiled.
    #[error("E2007: invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
