//! Scratch copies of fixture projects.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Absolute path to the shared test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/slsgen-test
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(Path::parent)
        .unwrap_or(manifest)
        .join("tests/fixtures")
}

/// A fixture project copied into a temporary directory.
///
/// The copy is removed when dropped.
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    /// Copy `tests/fixtures/<name>` into a fresh temporary directory.
    pub fn copy(name: &str) -> io::Result<Self> {
        let source = fixtures_dir().join(name);
        let dir = TempDir::new()?;

        for entry in WalkDir::new(&source) {
            let entry = entry.map_err(io::Error::other)?;
            let Ok(relative) = entry.path().strip_prefix(&source) else {
                continue;
            };
            let target = dir.path().join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                fs::copy(entry.path(), &target)?;
            }
        }

        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The project's `serverless.yml`.
    pub fn config(&self) -> PathBuf {
        self.root().join("serverless.yml")
    }

    /// Rewrite `serverless.yml` through `edit`.
    pub fn edit_config(&self, edit: impl FnOnce(&mut Value)) -> io::Result<()> {
        let path = self.config();
        let content = fs::read_to_string(&path)?;
        let mut value: Value = serde_yaml::from_str(&content).map_err(io::Error::other)?;
        edit(&mut value);
        let content = serde_yaml::to_string(&value).map_err(io::Error::other)?;
        fs::write(path, content)
    }

    /// Read a YAML file under the project as a JSON value.
    pub fn read_yaml(&self, relative: &str) -> io::Result<Value> {
        let content = fs::read_to_string(self.root().join(relative))?;
        serde_yaml::from_str(&content).map_err(io::Error::other)
    }
}
