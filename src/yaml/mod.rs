//! Comment-preserving YAML editing.
//!
//! # Module Organization
//!
//! - [`node`]: the document tree, with comments and layout on every node
//! - [`parser`] / [`emitter`]: text to tree and back
//! - [`scalar`]: plain scalar typing, quoting and escapes
//! - [`value`]: native values and the node codec
//! - [`path`]: path parsing and resolution
//! - [`mutation`]: get, set, delete and array operations
//! - [`wildcard`]: `*`, `**` and `[*]` patterns
//! - [`merge`]: merging a donor tree into a base tree
//! - [`schema`] / [`validate`]: validation rules and the validator
//! - [`query`]: type names, lengths and mapping contents for the CLI
//! - [`document`]: the facade tying all of the above together

mod document;
mod error;
pub mod emitter;
pub mod merge;
pub mod mutation;
pub mod node;
pub mod parser;
pub mod path;
pub mod query;
pub mod scalar;
mod schema;
pub mod validate;
pub mod value;
pub mod wildcard;

pub use document::{Document, FromScalar};
pub use error::Error;
pub use node::{Kind, Node, Style};
pub use path::{Path, Segment};
pub use schema::{RuleType, ValidationRule};
pub use value::{EncodeOptions, ScalarType, Value};
pub use wildcard::Pattern;

// =============================================================================
// Version
// =============================================================================

/// Get the fyaml C library version.
pub fn get_version() -> Result<String, String> {
    fyaml::get_c_version().map_err(|e| e.to_string())
}
