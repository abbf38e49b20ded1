//! Serverless configuration generator for Ts.ED controllers.
//!
//! Finds entry files, has the API description document produced, then
//! assembles one function per controller route and one API Gateway model per
//! schema, and merges them into the service configuration.
//!
//! Generated entries never replace entries already written in the
//! configuration.

pub mod assemble;
pub mod document;
pub mod error;
pub mod files;
pub mod merge;
pub mod models;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod service;

pub use assemble::{assemble, AssembledFunction, AssemblyContext, FunctionDescriptor};
pub use document::{
    load_document, CommandGenerator, DocumentGenerator, ExistingDocument, GenerationRequest,
};
pub use error::GenerateError;
pub use files::{find_files, Glob};
pub use merge::merge;
pub use models::{generate_models, GeneratedModels};
pub use naming::{function_name, rewrite_path};
pub use options::PluginOptions;
pub use pipeline::{generate, GenerateOutcome, GenerateRequest};
pub use service::ServiceConfig;
