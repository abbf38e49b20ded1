//! Route discovery: entry files to controller classes and their routes.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::ScanError;
use crate::parser::parse_source;
use crate::syntax::{ClassDecl, PropertyAssignment, SourceFile};
use crate::visit::{self, Visitor};

/// Property key whose array lists the controllers of an entry file.
pub const CONTROLLER_SENTINEL: &str = "lambda";

/// Extension appended to resolved controller import paths.
pub const SOURCE_EXTENSION: &str = "ts";

/// Class-level annotation carrying the base path.
pub const CONTROLLER_ANNOTATION: &str = "Controller";

/// HTTP verbs recognized as route annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
    Connect,
}

impl HttpVerb {
    /// Map an annotation name (`Get`, `Post`, ...) to its verb.
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name {
            "Get" => Some(Self::Get),
            "Post" => Some(Self::Post),
            "Put" => Some(Self::Put),
            "Delete" => Some(Self::Delete),
            "Patch" => Some(Self::Patch),
            "Head" => Some(Self::Head),
            "Options" => Some(Self::Options),
            "Trace" => Some(Self::Trace),
            "Connect" => Some(Self::Connect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
            Self::Connect => "connect",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route: a method carrying a verb annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMethod {
    pub method_key: String,
    pub verb: HttpVerb,
    /// Path as written, possibly with `:name` segments.
    pub path_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerDescriptor {
    pub class_name: String,
    /// Empty when the class has no `Controller` annotation.
    pub base_path: String,
    pub routes: Vec<RouteMethod>,
}

/// A controller class found through an entry file.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredController {
    pub entry_file: PathBuf,
    pub source_path: PathBuf,
    pub descriptor: ControllerDescriptor,
    #[serde(skip)]
    pub class: ClassDecl,
}

/// True if the file name, minus its last extension, still contains a dot.
pub fn has_dot_in_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = match name.rfind('.') {
        Some(i) if i + 1 < name.len() => &name[..i],
        _ => name,
    };
    stem.contains('.')
}

/// Reject the first entry file with a dotted name.
pub fn check_entry_files(entry_files: &[PathBuf]) -> Result<(), ScanError> {
    match entry_files.iter().find(|p| has_dot_in_file_name(p)) {
        Some(path) => Err(ScanError::DottedFileName { path: path.clone() }),
        None => Ok(()),
    }
}

/// Read and parse a source file.
pub fn load_source(path: &Path) -> Result<SourceFile, ScanError> {
    let src = std::fs::read_to_string(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&src).map_err(|e| ScanError::Syntax {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}

/// Controller source paths referenced by an entry file's sentinel arrays.
///
/// Each listed identifier is matched against the named imports; the import
/// specifier is resolved against the entry file's directory. Duplicates are
/// dropped, first occurrence wins.
pub fn controller_paths(entry_file: &Path, source: &SourceFile) -> Vec<PathBuf> {
    let mut sentinel = SentinelCollector::default();
    visit::walk_source(&mut sentinel, source);

    let base = entry_file.parent().unwrap_or_else(|| Path::new(""));
    let mut paths: Vec<PathBuf> = Vec::new();
    for identifier in &sentinel.identifiers {
        let Some(import) = source.import_of(identifier) else {
            continue;
        };
        let mut resolved = normalize(&base.join(&import.specifier)).into_os_string();
        resolved.push(".");
        resolved.push(SOURCE_EXTENSION);
        let resolved = PathBuf::from(resolved);
        if !paths.contains(&resolved) {
            paths.push(resolved);
        }
    }
    paths
}

/// Base path and routes of one class.
pub fn describe_controller(class: &ClassDecl) -> ControllerDescriptor {
    let base_path = class
        .decorator(CONTROLLER_ANNOTATION)
        .and_then(|d| d.first_argument_unquoted())
        .unwrap_or_default();

    let mut routes = Vec::new();
    for method in class.instance_methods() {
        for decorator in &method.decorators {
            let Some(verb) = decorator.name().and_then(HttpVerb::from_annotation) else {
                continue;
            };
            routes.push(RouteMethod {
                method_key: method.name.clone(),
                verb,
                path_template: decorator.first_argument_unquoted().unwrap_or_default(),
            });
        }
    }

    ControllerDescriptor {
        class_name: class.name.clone(),
        base_path,
        routes,
    }
}

/// Discover every controller class reachable from the entry files, in
/// entry order, then controller order, then class order.
///
/// Dotted entry file names are rejected before any file is read.
pub fn discover(entry_files: &[PathBuf]) -> Result<Vec<DiscoveredController>, ScanError> {
    check_entry_files(entry_files)?;

    let mut discovered = Vec::new();
    for entry_file in entry_files {
        let entry = load_source(entry_file)?;
        let controllers = controller_paths(entry_file, &entry);
        tracing::debug!(
            entry = %entry_file.display(),
            controllers = controllers.len(),
            "scanned entry file"
        );

        for source_path in controllers {
            let source = load_source(&source_path)?;
            for class in source.classes {
                let descriptor = describe_controller(&class);
                tracing::debug!(
                    class = %descriptor.class_name,
                    base_path = %descriptor.base_path,
                    routes = descriptor.routes.len(),
                    "discovered controller"
                );
                discovered.push(DiscoveredController {
                    entry_file: entry_file.clone(),
                    source_path: source_path.clone(),
                    descriptor,
                    class,
                });
            }
        }
    }
    Ok(discovered)
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[derive(Default)]
struct SentinelCollector {
    identifiers: Vec<String>,
}

impl Visitor for SentinelCollector {
    fn visit_property(&mut self, property: &PropertyAssignment) {
        if property.key != CONTROLLER_SENTINEL {
            return;
        }
        let Some(array) = property.value.as_array() else {
            return;
        };
        for element in &array.elements {
            if let Some(name) = element.as_identifier().filter(|n| !n.contains('.')) {
                self.identifiers.push(name.to_string());
            }
        }
    }
}
