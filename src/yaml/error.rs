//! Error types for YAML operations.

use std::fmt;
use std::io;

/// Error type for YAML operations.
///
/// Every variant that concerns a location in the tree carries the rendered
/// path (`a.b[2].c`, empty for the document root).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Mapping lookup found no such key
    KeyNotFound { path: String, key: String },
    /// Sequence index negative or past the end
    IndexOutOfBounds { path: String, index: i64, len: usize },
    /// A key segment was applied to a non-mapping node
    NotAMapping { path: String },
    /// An index segment was applied to a non-sequence node
    NotASequence { path: String },
    /// An array operator targeted a node that is not a sequence
    NotAnArray { path: String },
    /// Node type does not match the requested or declared type
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },
    /// Requested type name is not one the operator supports
    UnsupportedType(String),
    /// Node kind cannot be decoded into a native value
    UnsupportedNode { path: String, kind: String },
    /// Regular expression in a schema rule does not compile
    InvalidPattern {
        path: String,
        pattern: String,
        message: String,
    },
    /// Schema requires a key the mapping lacks
    RequiredFieldMissing { path: String, field: String },
    /// Mapping has a key not declared by a closed schema
    AdditionalPropertyNotAllowed { path: String, property: String },
    /// Value is not one of the allowed enum values
    EnumViolation {
        path: String,
        value: String,
        allowed: Vec<String>,
    },
    /// Length, range, item-count, pattern or uniqueness constraint failed
    ConstraintViolation { path: String, message: String },
    /// Merge was given no donor document
    NilDocument,
    /// Malformed source text
    Parse { line: usize, message: String },
    /// Tab characters used for indentation
    UnsupportedIndentation { line: usize },
    /// Path string is not well formed for the operation
    InvalidPath { path: String, message: String },
    /// Schema document does not describe a valid rule tree
    InvalidSchema(String),
    /// I/O error
    Io(String),
}

impl Error {
    /// Path at which the error occurred, for path-qualified errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::KeyNotFound { path, .. }
            | Error::IndexOutOfBounds { path, .. }
            | Error::NotAMapping { path }
            | Error::NotASequence { path }
            | Error::NotAnArray { path }
            | Error::TypeMismatch { path, .. }
            | Error::UnsupportedNode { path, .. }
            | Error::InvalidPattern { path, .. }
            | Error::RequiredFieldMissing { path, .. }
            | Error::AdditionalPropertyNotAllowed { path, .. }
            | Error::EnumViolation { path, .. }
            | Error::ConstraintViolation { path, .. }
            | Error::InvalidPath { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True for errors caused by addressing something absent or of the
    /// wrong shape, which the CLI treats as soft failures under `-q`.
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Error::KeyNotFound { .. }
                | Error::IndexOutOfBounds { .. }
                | Error::NotAMapping { .. }
                | Error::NotASequence { .. }
                | Error::InvalidPath { .. }
        )
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

fn location(path: &str) -> String {
    if path.is_empty() {
        "at root".to_string()
    } else {
        format!("at '{}'", path)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::KeyNotFound { path, key } => {
                write!(f, "invalid path '{}', missing key '{}' in struct.", path, key)
            }
            Error::IndexOutOfBounds { path, index, len } => write!(
                f,
                "invalid path '{}', index {} is out of range ({} elements in sequence).",
                path, index, len
            ),
            Error::NotAMapping { path } => {
                write!(f, "invalid path '{}', cannot look up a key in a non-struct.", path)
            }
            Error::NotASequence { path } => {
                write!(f, "invalid path '{}', cannot index a non-sequence.", path)
            }
            Error::NotAnArray { path } => write!(f, "value {} is not an array", location(path)),
            Error::TypeMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "Type mismatch {}: expected {}, got {}",
                location(path),
                expected,
                found
            ),
            Error::UnsupportedType(t) => write!(f, "unsupported type '{}'", t),
            Error::UnsupportedNode { path, kind } => {
                write!(f, "cannot decode {} node {}", kind, location(path))
            }
            Error::InvalidPattern {
                path,
                pattern,
                message,
            } => write!(
                f,
                "invalid pattern '{}' {}: {}",
                pattern,
                location(path),
                message
            ),
            Error::RequiredFieldMissing { path, field } => {
                write!(f, "required field '{}' missing {}", field, location(path))
            }
            Error::AdditionalPropertyNotAllowed { path, property } => write!(
                f,
                "additional property '{}' not allowed {}",
                property,
                location(path)
            ),
            Error::EnumViolation {
                path,
                value,
                allowed,
            } => write!(
                f,
                "value {} {} is not one of [{}]",
                value,
                location(path),
                allowed.join(", ")
            ),
            Error::ConstraintViolation { path, message } => {
                write!(f, "{} {}", message, location(path))
            }
            Error::NilDocument => write!(f, "cannot merge a nil document"),
            Error::Parse { line, message } => {
                if *line == 0 {
                    write!(f, "Failed to parse YAML: {}", message)
                } else {
                    write!(f, "Failed to parse YAML at line {}: {}", line, message)
                }
            }
            Error::UnsupportedIndentation { line } => write!(
                f,
                "unsupported indentation at line {}: tabs are not allowed",
                line
            ),
            Error::InvalidPath { path, message } => {
                write!(f, "invalid path '{}', {}.", path, message)
            }
            Error::InvalidSchema(e) => write!(f, "invalid schema: {}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}
