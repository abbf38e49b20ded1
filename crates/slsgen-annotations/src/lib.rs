//! Static analysis of Ts.ED controller sources.
//!
//! Tokenizes and parses TypeScript entry and controller files without
//! executing them, recovers which controllers an entry file registers, and
//! builds per-method annotation tables (including chained and
//! parameter-level decorators).

pub mod discover;
pub mod error;
pub mod extract;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod syntax;
pub mod visit;

pub use discover::{
    check_entry_files, controller_paths, describe_controller, discover, has_dot_in_file_name,
    load_source, ControllerDescriptor, DiscoveredController, HttpVerb, RouteMethod,
};
pub use error::ScanError;
pub use extract::{extract, extract_method, parse_arguments};
pub use model::{AnnotationOccurrence, AnnotationTable, AnnotationValue, ParameterBinding};
pub use parser::parse_source;
