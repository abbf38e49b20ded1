//! Schema resolution for API Gateway request and response models.
//!
//! Takes a Swagger 2 / OpenAPI 3 document and produces, per named model, a
//! self-contained draft-07 schema: references are pulled into a local
//! `definitions` map, cycles are broken with `$ref` nodes, single-alternative
//! compositions are merged, and property keywords the gateway rejects are
//! stripped.

pub mod error;
pub mod graph;
pub mod node;
pub mod resolve;

pub use error::ResolveError;
pub use graph::{ParameterSpec, SchemaGraph};
pub use node::{SchemaNode, SUPPORTED_KEYWORDS};
pub use resolve::{resolve, ResolvedSchema, SchemaCache, DRAFT_07};
