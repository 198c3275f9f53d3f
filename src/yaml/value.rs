//! Native values and the codec between values and nodes.

use super::error::Error;
use super::node::{Node, NodeData, Scalar, Style, Tag};
use super::path::Path;
use super::scalar;
use indexmap::IndexMap;
use std::fmt;

/// A decoded value.
///
/// Maps keep the order they were read in; encoding a map sorts its keys
/// unless [`EncodeOptions::sort_keys`] is off.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

/// Defaults applied to nodes the engine creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Indentation of new nested block collections
    pub indent: usize,
    /// Style of newly encoded lists
    pub sequence_style: Style,
    /// Style of newly encoded maps
    pub mapping_style: Style,
    /// Sort map keys when encoding a whole map
    pub sort_keys: bool,
}

pub const DEFAULT_INDENT: usize = 2;

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: DEFAULT_INDENT,
            sequence_style: Style::Flow,
            mapping_style: Style::Block,
            sort_keys: true,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Equality with numbers compared by value (`1 == 1.0`).
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                match (self.as_i64(), other.as_i64()) {
                    (Some(a), Some(b)) => a == b,
                    _ => self.as_f64() == other.as_f64(),
                }
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map_or(false, |w| v.loosely_equals(w)))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    /// Flow-style text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let node = encode(self, &EncodeOptions::default());
        write!(f, "{}", super::emitter::emit_flow(&node))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Conversion from values parsed by libfyaml (command-line `-y` values).
impl TryFrom<fyaml::Value> for Value {
    type Error = Error;

    fn try_from(value: fyaml::Value) -> Result<Self, Error> {
        Ok(match value {
            fyaml::Value::Null => Value::Null,
            fyaml::Value::Bool(b) => Value::Bool(b),
            fyaml::Value::Number(fyaml::Number::Int(i)) => Value::Int(i),
            fyaml::Value::Number(fyaml::Number::UInt(u)) => match i64::try_from(u) {
                Ok(i) => Value::Int(i),
                Err(_) => Value::Float(u as f64),
            },
            fyaml::Value::Number(fyaml::Number::Float(f)) => Value::Float(f),
            fyaml::Value::String(s) => Value::String(s),
            fyaml::Value::Sequence(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            fyaml::Value::Mapping(map) => {
                let mut out = IndexMap::new();
                for (k, v) in map {
                    let key = match Value::try_from(k)? {
                        Value::String(s) => s,
                        Value::Null => "null".to_string(),
                        Value::Bool(b) => b.to_string(),
                        Value::Int(i) => i.to_string(),
                        Value::Float(f) => scalar::format_float(f),
                        other => {
                            return Err(Error::UnsupportedType(format!(
                                "{} as mapping key",
                                value_type(&other)
                            )))
                        }
                    };
                    out.insert(key, Value::try_from(v)?);
                }
                Value::Map(out)
            }
            fyaml::Value::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

/// Name of a value's type, as used in error messages.
pub fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::List(_) => "sequence",
        Value::Map(_) => "mapping",
    }
}

/// Name of a node's type, as used in error messages.
pub fn node_type(node: &Node) -> String {
    match &node.data {
        NodeData::Scalar(s) => s.tag.name().to_string(),
        _ => node.kind().to_string(),
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Build a new node for `value`.
pub fn encode(value: &Value, opts: &EncodeOptions) -> Node {
    match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::scalar(Scalar::new(Tag::Bool, b.to_string())),
        Value::Int(i) => Node::scalar(Scalar::new(Tag::Int, i.to_string())),
        Value::Float(f) => Node::scalar(Scalar::new(Tag::Float, scalar::format_float(*f))),
        Value::String(s) => Node::string(s.as_str()),
        Value::List(items) => {
            let mut node = Node::sequence(opts.sequence_style);
            for item in items {
                node.push(encode(item, opts));
            }
            node
        }
        Value::Map(map) => {
            let mut node = Node::mapping(opts.mapping_style);
            let mut keys: Vec<&String> = map.keys().collect();
            if opts.sort_keys {
                keys.sort();
            }
            for key in keys {
                node.insert(key, encode(&map[key.as_str()], opts));
            }
            node
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a node into a native value. `path` locates the node for errors.
pub fn decode(node: &Node, path: &Path) -> Result<Value, Error> {
    match &node.data {
        NodeData::Scalar(s) => decode_scalar(s, path),
        NodeData::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode(item, &path.child_index(i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        NodeData::Mapping(entries) => {
            let mut map = IndexMap::with_capacity(entries.len());
            for entry in entries {
                let key = entry.key_str();
                map.insert(key.to_string(), decode(&entry.value, &path.child_key(key))?);
            }
            Ok(Value::Map(map))
        }
        NodeData::Alias(_) => Err(Error::UnsupportedNode {
            path: path.to_string(),
            kind: node.kind().to_string(),
        }),
    }
}

fn decode_scalar(s: &Scalar, path: &Path) -> Result<Value, Error> {
    let mismatch = || Error::TypeMismatch {
        path: path.to_string(),
        expected: s.tag.name().to_string(),
        found: format!("'{}'", s.value),
    };
    match s.tag {
        Tag::Null => Ok(Value::Null),
        Tag::String => Ok(Value::String(s.value.clone())),
        Tag::Bool => scalar::parse_bool(&s.value)
            .map(Value::Bool)
            .ok_or_else(mismatch),
        Tag::Int => scalar::parse_int(&s.value)
            .map(Value::Int)
            .ok_or_else(mismatch),
        Tag::Float => scalar::parse_float(&s.value)
            .or_else(|| s.value.parse::<f64>().ok().filter(|f| f.is_finite()))
            .map(Value::Float)
            .ok_or_else(mismatch),
    }
}

// =============================================================================
// Coercion
// =============================================================================

/// Native type requested from a typed accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
}

impl std::str::FromStr for ScalarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "string" | "str" => Ok(ScalarType::String),
            "int" => Ok(ScalarType::Int),
            "float" => Ok(ScalarType::Float),
            "bool" => Ok(ScalarType::Bool),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}

impl ScalarType {
    fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }
}

/// Read a scalar node as `target`, parsing its text when the tag differs.
pub fn coerce(node: &Node, path: &Path, target: ScalarType) -> Result<Value, Error> {
    let mismatch = || Error::TypeMismatch {
        path: path.to_string(),
        expected: target.name().to_string(),
        found: node_type(node),
    };
    let s = match node.as_scalar() {
        Some(s) if s.tag != Tag::Null => s,
        _ => return Err(mismatch()),
    };
    let text = s.value.trim();
    match target {
        ScalarType::String => Ok(Value::String(s.value.clone())),
        ScalarType::Int => match s.tag {
            Tag::Int | Tag::String => scalar::parse_int(text).map(Value::Int).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ScalarType::Float => match s.tag {
            Tag::Int | Tag::Float | Tag::String => scalar::parse_float(text)
                .or_else(|| scalar::parse_int(text).map(|i| i as f64))
                .map(Value::Float)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ScalarType::Bool => match s.tag {
            Tag::Bool => scalar::parse_bool(text).map(Value::Bool).ok_or_else(mismatch),
            Tag::String | Tag::Int => parse_loose_bool(text).map(Value::Bool).ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}

/// Booleans written the way configuration files often write them.
pub fn parse_loose_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
