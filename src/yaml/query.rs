//! Read-only queries used by the command line: type names, lengths and
//! mapping contents.

use super::error::Error;
use super::node::{Node, NodeData, Tag};
use super::path::{self, Path};

// =============================================================================
// Type Name Helpers
// =============================================================================

/// Type name of a node as the `get-type` action prints it. An explicit
/// non-core tag (`!custom`) is reported as is.
pub fn type_name(node: &Node) -> String {
    if let Some(tag) = node.explicit_tag() {
        if !tag.starts_with("!!") && !tag.starts_with("!<tag:yaml.org,2002:") {
            return tag.to_string();
        }
    }
    let name = match &node.data {
        NodeData::Scalar(s) => match s.tag {
            Tag::Null => "NoneType",
            Tag::Bool => "bool",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::String => "str",
        },
        NodeData::Sequence(_) => "sequence",
        NodeData::Mapping(_) => "struct",
        NodeData::Alias(_) => "alias",
    };
    name.to_string()
}

fn unsupported(action: &str, node: &Node, path: &Path, expected: &str) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        expected: format!("{} ({} needs one)", expected, action),
        found: type_name(node),
    }
}

fn mapping_at<'a>(root: &'a Node, path: &Path, action: &str) -> Result<&'a Node, Error> {
    let node = path::resolve(root, path)?;
    if node.is_mapping() {
        Ok(node)
    } else {
        Err(unsupported(action, node, path, "struct"))
    }
}

// =============================================================================
// Queries
// =============================================================================

pub fn get_type(root: &Node, path: &Path) -> Result<String, Error> {
    path::resolve(root, path).map(type_name)
}

/// Number of items of a sequence or entries of a mapping.
pub fn get_length(root: &Node, path: &Path) -> Result<usize, Error> {
    let node = path::resolve(root, path)?;
    if node.is_collection() {
        Ok(node.len())
    } else {
        Err(unsupported("get-length", node, path, "sequence or struct"))
    }
}

pub fn keys(root: &Node, path: &Path) -> Result<Vec<String>, Error> {
    let node = mapping_at(root, path, "keys")?;
    Ok(node.entries().iter().map(|e| e.key_str().to_string()).collect())
}

pub fn values<'a>(root: &'a Node, path: &Path) -> Result<Vec<&'a Node>, Error> {
    let node = mapping_at(root, path, "values")?;
    Ok(node.entries().iter().map(|e| &e.value).collect())
}

pub fn key_values<'a>(root: &'a Node, path: &Path) -> Result<Vec<(String, &'a Node)>, Error> {
    let node = mapping_at(root, path, "key-values")?;
    Ok(node
        .entries()
        .iter()
        .map(|e| (e.key_str().to_string(), &e.value))
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
