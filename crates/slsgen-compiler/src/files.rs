//! Entry file discovery by glob pattern.

use std::path::{Path, PathBuf};

use regex_lite::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::error::GenerateError;

/// Directories never searched.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

/// A compiled glob matched against `/`-separated relative paths.
///
/// Supports `**`, `*`, `?`, `[...]` classes and `{a,b}` alternatives.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, GenerateError> {
        let normalized = pattern.trim_start_matches("./");
        let source = translate(normalized).map_err(|reason| GenerateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        })?;
        let regex = Regex::new(&source).map_err(|e| GenerateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }
}

fn translate(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut in_alternatives = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                let at_segment_start = i == 0 || chars[i - 1] == '/';
                if at_segment_start && chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let Some(len) = chars[i..].iter().position(|&c| c == ']') else {
                    return Err("unclosed character class".to_string());
                };
                let mut class: String = chars[i + 1..i + len].iter().collect();
                if let Some(rest) = class.strip_prefix('!') {
                    class = format!("^{rest}");
                }
                out.push('[');
                out.push_str(&class);
                out.push(']');
                i += len + 1;
                continue;
            }
            '{' if !in_alternatives => {
                in_alternatives = true;
                out.push_str("(?:");
            }
            ',' if in_alternatives => out.push('|'),
            '}' if in_alternatives => {
                in_alternatives = false;
                out.push(')');
            }
            other => out.push_str(&regex_lite::escape(&other.to_string())),
        }
        i += 1;
    }

    if in_alternatives {
        return Err("unclosed alternative group".to_string());
    }
    out.push('$');
    Ok(out)
}

/// Files under `root` matching any pattern, sorted and de-duplicated.
///
/// Hidden directories and `node_modules` are not searched.
pub fn find_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, GenerateError> {
    let globs = patterns
        .iter()
        .map(|p| Glob::new(p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    path = ?e.path(),
                    error = %e,
                    "skipping unreadable entry"
                );
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if globs.iter().any(|g| g.is_match(&relative)) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(root = %root.display(), matched = files.len(), "globbed files");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn glob_matching() {
        let glob = Glob::new("**/*module.*").unwrap();
        assert!(glob.is_match("app-module.ts"));
        assert!(glob.is_match("src/modules/crud/get-crud-module.ts"));
        assert!(!glob.is_match("src/modules/crud/get-crud-controller.ts"));

        let glob = Glob::new("src/**/*.{ts,js}").unwrap();
        assert!(glob.is_match("src/a.ts"));
        assert!(glob.is_match("src/x/y/b.js"));
        assert!(!glob.is_match("lib/a.ts"));

        let glob = Glob::new("./src/?-[!b]*.ts").unwrap();
        assert!(glob.is_match("src/a-cat.ts"));
        assert!(!glob.is_match("src/a-bat.ts"));
    }

    #[test]
    fn invalid_patterns() {
        let err = Glob::new("src/[abc").unwrap_err();
        assert!(err.to_string().starts_with("E2007"));
        assert!(Glob::new("src/{a,b").is_err());
    }

    #[test]
    fn find_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/users/users-module.ts");
        touch(dir.path(), "src/app-module.ts");
        touch(dir.path(), "src/users/users-controller.ts");
        touch(dir.path(), "node_modules/lib/lib-module.ts");
        touch(dir.path(), ".serverless/cache-module.ts");

        let files = find_files(
            dir.path(),
            &["**/*module.*".to_string(), "src/app-module.ts".to_string()],
        )
        .unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("src/app-module.ts"),
                dir.path().join("src/users/users-module.ts"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_are_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/app-module.ts");
        std::os::unix::fs::symlink(
            dir.path().join("missing"),
            dir.path().join("src/dangling-module.ts"),
        )
        .unwrap();

        let files = find_files(dir.path(), &["**/*module.*".to_string()]).unwrap();
        assert_eq!(files, vec![dir.path().join("src/app-module.ts")]);
    }
}
