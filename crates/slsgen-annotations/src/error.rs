use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while scanning entry and controller sources (E1001, E1002, E2001).
#[derive(Debug, Error)]
pub enum ScanError {
    /// E1001: Source file could not be read.
    #[error("E1001: cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// E1002: Source file could not be tokenized.
    #[error("E1002: {}:{line}: {message}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// E2001: Entry file name contains a dot before its extension.
    #[error("E2001: file name must not contain '.' (dot): {}", path.display())]
    DottedFileName { path: PathBuf },
}
