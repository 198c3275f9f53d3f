//! The document facade: owns the tree and exposes every operation by path
//! string.

use super::emitter::emit_document;
use super::error::Error;
use super::merge;
use super::mutation;
use super::node::{Node, NodeData, Style};
use super::parser;
use super::path::{self, Path, Segment};
use super::schema::ValidationRule;
use super::validate;
use super::value::{self, EncodeOptions, ScalarType, Value, DEFAULT_INDENT};
use super::wildcard::{self, Pattern};
use indexmap::IndexMap;
use log::{debug, trace};
use std::fmt;
use std::fs;

/// A native type the typed getters can produce.
pub trait FromScalar: Sized {
    const TARGET: ScalarType;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromScalar for String {
    const TARGET: ScalarType = ScalarType::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromScalar for i64 {
    const TARGET: ScalarType = ScalarType::Int;

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromScalar for f64 {
    const TARGET: ScalarType = ScalarType::Float;

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromScalar for bool {
    const TARGET: ScalarType = ScalarType::Bool;

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

/// An editable YAML document.
///
/// Every operation changes the tree in place and leaves it untouched when
/// it fails. Text is produced from the tree on demand by [`Display`].
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    head: Vec<String>,
    margin: usize,
    crlf: bool,
    options: EncodeOptions,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a mapping root.
    pub fn new() -> Self {
        Self {
            root: Node::mapping(Style::Block),
            head: Vec::new(),
            margin: 0,
            crlf: false,
            options: EncodeOptions::default(),
        }
    }

    pub fn load(text: &str) -> Result<Self, Error> {
        let parsed = parser::parse(text)?;
        let indent = detect_indent(&parsed.root);
        debug!(
            "loaded {} root, indentation {}",
            parsed.root.kind(),
            indent
        );
        Ok(Self {
            root: parsed.root,
            head: parsed.head,
            margin: parsed.margin,
            crlf: parsed.crlf,
            options: EncodeOptions {
                indent,
                ..EncodeOptions::default()
            },
        })
    }

    pub fn load_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::Parse {
            line: 0,
            message: format!("input is not valid UTF-8: {}", e),
        })?;
        Self::load(text)
    }

    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| Error::Io(format!("Failed to read '{}': {}", path.display(), e)))?;
        Self::load_bytes(&bytes)
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())
            .map_err(|e| Error::Io(format!("Failed to write '{}': {}", path.display(), e)))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Indentation used for new block collections.
    pub fn indent(&self) -> usize {
        self.options.indent
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: EncodeOptions) {
        self.options = options;
    }

    pub fn is_array_root(&self) -> bool {
        self.root.is_sequence()
    }

    // =========================================================================
    // Get / Set
    // =========================================================================

    pub fn get(&self, path: &str) -> Result<Value, Error> {
        mutation::get(&self.root, &Path::parse(path)?)
    }

    /// The node at `path`, for callers that print sub-trees.
    pub fn get_node(&self, path: &str) -> Result<&Node, Error> {
        path::resolve(&self.root, &Path::parse(path)?)
    }

    pub fn has(&self, path: &str) -> bool {
        Path::parse(path).map_or(false, |p| mutation::has(&self.root, &p))
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), Error> {
        let path = Path::parse(path)?;
        mutation::set(&mut self.root, &path, &value.into(), &self.options)
    }

    pub fn delete(&mut self, path: &str) -> Result<(), Error> {
        mutation::delete(&mut self.root, &Path::parse(path)?).map(|_| ())
    }

    /// Value at `path` as a native type, converting from text when needed.
    pub fn get_as<T: FromScalar>(&self, path: &str) -> Result<T, Error> {
        let path = Path::parse(path)?;
        let value = mutation::get_typed(&self.root, &path, T::TARGET)?;
        take(value, &path)
    }

    /// Items of the sequence at `path` as a native type.
    pub fn get_slice<T: FromScalar>(&self, path: &str) -> Result<Vec<T>, Error> {
        let path = Path::parse(path)?;
        mutation::get_typed_list(&self.root, &path, T::TARGET)?
            .into_iter()
            .enumerate()
            .map(|(i, v)| take(v, &path.child_index(i)))
            .collect()
    }

    /// Entries of the mapping at `path`, values as a native type.
    pub fn get_map<T: FromScalar>(&self, path: &str) -> Result<IndexMap<String, T>, Error> {
        let path = Path::parse(path)?;
        mutation::get_typed_map(&self.root, &path, T::TARGET)?
            .into_iter()
            .map(|(k, v)| {
                let item = take(v, &path.child_key(&k))?;
                Ok((k, item))
            })
            .collect()
    }

    pub fn get_string(&self, path: &str) -> Result<String, Error> {
        self.get_as(path)
    }

    pub fn get_int(&self, path: &str) -> Result<i64, Error> {
        self.get_as(path)
    }

    pub fn get_float(&self, path: &str) -> Result<f64, Error> {
        self.get_as(path)
    }

    pub fn get_bool(&self, path: &str) -> Result<bool, Error> {
        self.get_as(path)
    }

    pub fn get_string_slice(&self, path: &str) -> Result<Vec<String>, Error> {
        self.get_slice(path)
    }

    pub fn get_int_slice(&self, path: &str) -> Result<Vec<i64>, Error> {
        self.get_slice(path)
    }

    pub fn get_float_slice(&self, path: &str) -> Result<Vec<f64>, Error> {
        self.get_slice(path)
    }

    pub fn get_bool_slice(&self, path: &str) -> Result<Vec<bool>, Error> {
        self.get_slice(path)
    }

    pub fn get_string_map(&self, path: &str) -> Result<IndexMap<String, String>, Error> {
        self.get_map(path)
    }

    pub fn get_int_map(&self, path: &str) -> Result<IndexMap<String, i64>, Error> {
        self.get_map(path)
    }

    pub fn get_float_map(&self, path: &str) -> Result<IndexMap<String, f64>, Error> {
        self.get_map(path)
    }

    pub fn get_bool_map(&self, path: &str) -> Result<IndexMap<String, bool>, Error> {
        self.get_map(path)
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    pub fn append_to_array(&mut self, path: &str, value: impl Into<Value>) -> Result<(), Error> {
        let path = Path::parse(path)?;
        mutation::append(&mut self.root, &path, &value.into(), &self.options)
    }

    pub fn insert_into_array(
        &mut self,
        path: &str,
        index: i64,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let path = Path::parse(path)?;
        mutation::insert(&mut self.root, &path, index, &value.into(), &self.options)
    }

    pub fn remove_from_array(&mut self, path: &str, index: i64) -> Result<Value, Error> {
        mutation::remove(&mut self.root, &Path::parse(path)?, index)
    }

    pub fn update_array_element(
        &mut self,
        path: &str,
        index: i64,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let path = Path::parse(path)?;
        mutation::update(&mut self.root, &path, index, &value.into(), &self.options)
    }

    pub fn get_array_length(&self, path: &str) -> Result<usize, Error> {
        mutation::length(&self.root, &Path::parse(path)?)
    }

    pub fn get_array_element(&self, path: &str, index: i64) -> Result<Value, Error> {
        mutation::element(&self.root, &Path::parse(path)?, index)
    }

    /// Item at `index` read as `type_name` (`string`, `int`, `float`, `bool`).
    pub fn get_typed_array_element(
        &self,
        path: &str,
        index: i64,
        type_name: &str,
    ) -> Result<Value, Error> {
        mutation::typed_element(&self.root, &Path::parse(path)?, index, type_name)
    }

    // =========================================================================
    // Array-rooted documents
    // =========================================================================

    /// Path of `sub_path` inside item `index` of a sequence root.
    fn element_path(&self, index: i64, sub_path: &str) -> Result<Path, Error> {
        if !self.root.is_sequence() {
            return Err(Error::NotASequence {
                path: String::new(),
            });
        }
        let len = self.root.len();
        if usize::try_from(index).map_or(true, |i| i >= len) {
            return Err(Error::IndexOutOfBounds {
                path: format!("[{}]", index),
                index,
                len,
            });
        }
        let item = Path::new(vec![Segment::Index(index)]);
        Ok(item.join(&Path::parse(sub_path)?))
    }

    /// Set `sub_path` inside item `index` of a sequence root; an empty
    /// `sub_path` replaces the item.
    pub fn set_array_element(
        &mut self,
        index: i64,
        sub_path: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let path = self.element_path(index, sub_path)?;
        mutation::set(&mut self.root, &path, &value.into(), &self.options)
    }

    pub fn get_array_document_element(&self, index: i64, sub_path: &str) -> Result<Value, Error> {
        mutation::get(&self.root, &self.element_path(index, sub_path)?)
    }

    /// Append an item to a sequence root.
    pub fn add_array_element(&mut self, value: impl Into<Value>) -> Result<(), Error> {
        if !self.root.is_sequence() {
            return Err(Error::NotASequence {
                path: String::new(),
            });
        }
        trace!("add array element");
        self.root.push(value::encode(&value.into(), &self.options));
        Ok(())
    }

    // =========================================================================
    // Wildcards
    // =========================================================================

    pub fn get_all(&self, pattern: &str) -> Result<IndexMap<String, Value>, Error> {
        wildcard::get_all(&self.root, &Pattern::parse(pattern)?)
    }

    pub fn get_keys(&self, pattern: &str) -> Result<Vec<String>, Error> {
        Ok(wildcard::get_keys(&self.root, &Pattern::parse(pattern)?))
    }

    /// Set every match of `pattern`; returns how many nodes were set.
    pub fn set_all(&mut self, pattern: &str, value: impl Into<Value>) -> Result<usize, Error> {
        let pattern = Pattern::parse(pattern)?;
        wildcard::set_all(&mut self.root, &pattern, &value.into(), &self.options)
    }

    // =========================================================================
    // Merge / Validate
    // =========================================================================

    /// Merge `other` into this document.
    pub fn merge(&mut self, other: Option<&Document>) -> Result<(), Error> {
        merge::merge_into(&mut self.root, other.map(|d| &d.root))
    }

    /// Merge `other` into the node at `path`, creating it when absent.
    pub fn merge_at(&mut self, path: &str, other: Option<&Document>) -> Result<(), Error> {
        let path = Path::parse(path)?;
        merge::merge_at(&mut self.root, &path, other.map(|d| &d.root))
    }

    pub fn validate(&self, rule: &ValidationRule) -> Result<(), Error> {
        validate::validate(&self.root, rule)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = emit_document(
            &self.head,
            &self.root,
            self.margin,
            self.options.indent,
            self.crlf,
        );
        f.write_str(&text)
    }
}

fn take<T: FromScalar>(value: Value, path: &Path) -> Result<T, Error> {
    let found = value::value_type(&value);
    T::from_value(value).ok_or_else(|| Error::TypeMismatch {
        path: path.to_string(),
        expected: format!("{:?}", T::TARGET).to_lowercase(),
        found: found.to_string(),
    })
}

/// Indentation of nested block mappings, when the document is consistent
/// about it.
fn detect_indent(root: &Node) -> usize {
    let mut offsets = Vec::new();
    collect_offsets(root, &mut offsets);
    match offsets.first() {
        Some(&first) if [2, 4, 6, 8].contains(&first) && offsets.iter().all(|&o| o == first) => {
            first
        }
        _ => DEFAULT_INDENT,
    }
}

fn collect_offsets(node: &Node, offsets: &mut Vec<usize>) {
    match &node.data {
        NodeData::Mapping(entries) => {
            for entry in entries {
                let value = &entry.value;
                if value.is_mapping() && value.style == Style::Block && !value.is_empty() {
                    if let Some(offset) = value.layout.offset {
                        offsets.push(offset);
                    }
                }
                collect_offsets(value, offsets);
            }
        }
        NodeData::Sequence(items) => {
            for item in items {
                collect_offsets(item, offsets);
            }
        }
        _ => {}
    }
}
