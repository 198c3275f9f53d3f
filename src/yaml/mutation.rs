//! Mutation operations on a document tree.
//!
//! Every operation works on the root node and either succeeds or leaves the
//! tree untouched: write paths are probed before anything is created.

use super::error::Error;
use super::node::{Node, Style};
use super::path::{self, Leaf, Path, Segment};
use super::value::{self, coerce, decode, value_type, EncodeOptions, ScalarType, Value};
use log::{debug, trace};

/// Decoded value at `path`.
pub fn get(root: &Node, path: &Path) -> Result<Value, Error> {
    trace!("get '{}'", path);
    decode(path::resolve(root, path)?, path)
}

/// Value at `path` read as `target`.
pub fn get_typed(root: &Node, path: &Path, target: ScalarType) -> Result<Value, Error> {
    coerce(path::resolve(root, path)?, path, target)
}

/// Every item of the sequence at `path`, read as `target`.
pub fn get_typed_list(root: &Node, path: &Path, target: ScalarType) -> Result<Vec<Value>, Error> {
    let node = sequence_at(root, path)?;
    node.items()
        .iter()
        .enumerate()
        .map(|(i, item)| coerce(item, &path.child_index(i), target))
        .collect()
}

/// Every entry of the mapping at `path`, values read as `target`.
pub fn get_typed_map(
    root: &Node,
    path: &Path,
    target: ScalarType,
) -> Result<Vec<(String, Value)>, Error> {
    let node = path::resolve(root, path)?;
    if !node.is_mapping() {
        return Err(Error::NotAMapping {
            path: path.to_string(),
        });
    }
    node.entries()
        .iter()
        .map(|e| {
            let key = e.key_str();
            coerce(&e.value, &path.child_key(key), target).map(|v| (key.to_string(), v))
        })
        .collect()
}

pub fn has(root: &Node, path: &Path) -> bool {
    path::resolve(root, path).is_ok()
}

/// Set `path` to `value`, creating missing mapping keys on the way.
pub fn set(root: &mut Node, path: &Path, value: &Value, opts: &EncodeOptions) -> Result<(), Error> {
    trace!("set '{}' = {}", path, value);
    set_node(root, path, value::encode(value, opts))
}

/// Set `path` to a ready-made node. The node takes over the comments of
/// whatever it replaces.
pub fn set_node(root: &mut Node, path: &Path, mut node: Node) -> Result<(), Error> {
    if path.is_root() {
        if !node.is_collection() {
            return Err(Error::TypeMismatch {
                path: String::new(),
                expected: "mapping or sequence".to_string(),
                found: value::node_type(&node),
            });
        }
        node.adopt_position(root);
        *root = node;
        return Ok(());
    }
    let target = path::resolve_or_create(root, path, Leaf::Null)?;
    node.adopt_position(target);
    *target = node;
    Ok(())
}

/// Remove the mapping key or sequence item at `path`.
pub fn delete(root: &mut Node, path: &Path) -> Result<Node, Error> {
    trace!("delete '{}'", path);
    let segments = path.segments();
    let (last, parent_segments) = match segments.split_last() {
        Some(split) => split,
        None => {
            return Err(Error::InvalidPath {
                path: String::new(),
                message: "cannot delete the document root".to_string(),
            })
        }
    };
    path::resolve(root, path)?;
    let parent = path::resolve_mut(root, &Path::new(parent_segments.to_vec()))?;
    let removed = match last {
        Segment::Key(key) => parent.remove(key),
        Segment::Index(index) => parent.remove_item(*index as usize),
        _ => None,
    };
    removed.ok_or_else(|| Error::InvalidPath {
        path: path.to_string(),
        message: "nothing to delete".to_string(),
    })
}

// =============================================================================
// Arrays
// =============================================================================

/// The sequence at `path`; anything else is `NotAnArray`.
fn sequence_at<'a>(root: &'a Node, path: &Path) -> Result<&'a Node, Error> {
    let node = path::resolve(root, path)?;
    if node.is_sequence() {
        Ok(node)
    } else {
        Err(Error::NotAnArray {
            path: path.to_string(),
        })
    }
}

fn sequence_at_mut<'a>(root: &'a mut Node, path: &Path) -> Result<&'a mut Node, Error> {
    sequence_at(root, path)?;
    path::resolve_mut(root, path)
}

fn bounds(path: &Path, index: i64, len: usize, inclusive: bool) -> Result<usize, Error> {
    let limit = if inclusive { len + 1 } else { len };
    usize::try_from(index)
        .ok()
        .filter(|&i| i < limit)
        .ok_or_else(|| Error::IndexOutOfBounds {
            path: path.to_string(),
            index,
            len,
        })
}

/// Append `value` to the sequence at `path`. A missing path becomes a new
/// sequence holding just `value`.
pub fn append(
    root: &mut Node,
    path: &Path,
    value: &Value,
    opts: &EncodeOptions,
) -> Result<(), Error> {
    trace!("append '{}' <- {}", path, value);
    append_node(root, path, value::encode(value, opts), opts.sequence_style)
}

pub(crate) fn append_node(
    root: &mut Node,
    path: &Path,
    item: Node,
    style: Style,
) -> Result<(), Error> {
    let target = match path::probe(root, path)?.map(Node::is_sequence) {
        Some(false) => {
            return Err(Error::NotAnArray {
                path: path.to_string(),
            })
        }
        Some(true) => path::resolve_mut(root, path)?,
        None => {
            debug!("creating sequence at '{}'", path);
            path::resolve_or_create(root, path, Leaf::Sequence(style))?
        }
    };
    target.push(item);
    Ok(())
}

/// Insert `value` before position `index`; `index == len` appends.
pub fn insert(
    root: &mut Node,
    path: &Path,
    index: i64,
    value: &Value,
    opts: &EncodeOptions,
) -> Result<(), Error> {
    trace!("insert '{}'[{}] <- {}", path, index, value);
    let seq = sequence_at_mut(root, path)?;
    let i = bounds(path, index, seq.len(), true)?;
    seq.insert_item(i, value::encode(value, opts));
    Ok(())
}

/// Remove the item at `index` and return its value.
pub fn remove(root: &mut Node, path: &Path, index: i64) -> Result<Value, Error> {
    trace!("remove '{}'[{}]", path, index);
    let seq = sequence_at_mut(root, path)?;
    let i = bounds(path, index, seq.len(), false)?;
    // Decoded first so an item that cannot be returned stays in place
    let removed = decode(&seq.items()[i], &path.child_index(i))?;
    seq.remove_item(i);
    Ok(removed)
}

/// Replace the item at `index`, keeping its comments.
pub fn update(
    root: &mut Node,
    path: &Path,
    index: i64,
    value: &Value,
    opts: &EncodeOptions,
) -> Result<(), Error> {
    trace!("update '{}'[{}] <- {}", path, index, value);
    let seq = sequence_at_mut(root, path)?;
    let i = bounds(path, index, seq.len(), false)?;
    seq.replace_item(i, value::encode(value, opts));
    Ok(())
}

pub fn length(root: &Node, path: &Path) -> Result<usize, Error> {
    sequence_at(root, path).map(Node::len)
}

/// Decoded item at `index` of the sequence at `path`.
pub fn element(root: &Node, path: &Path, index: i64) -> Result<Value, Error> {
    let seq = sequence_at(root, path)?;
    let i = bounds(path, index, seq.len(), false)?;
    decode(&seq.items()[i], &path.child_index(i))
}

/// Item at `index` read as `target` (`string`, `int`, `float` or `bool`).
pub fn typed_element(root: &Node, path: &Path, index: i64, target: &str) -> Result<Value, Error> {
    let target: ScalarType = target.parse()?;
    let seq = sequence_at(root, path)?;
    let i = bounds(path, index, seq.len(), false)?;
    coerce(&seq.items()[i], &path.child_index(i), target)
}

/// Parse a command-line value: a literal string, or YAML when `as_yaml`.
pub fn parse_value(text: &str, as_yaml: bool) -> Result<Value, Error> {
    if !as_yaml {
        return Ok(Value::String(text.to_string()));
    }
    let parsed: fyaml::Value = text.parse().map_err(|e| Error::Parse {
        line: 0,
        message: format!("Failed to parse value as YAML: {}", e),
    })?;
    let value = Value::try_from(parsed)?;
    debug!("parsed value as {}", value_type(&value));
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
