//! Output formatting for query results.
//!
//! Scalars print as their plain text, collections as YAML sub-documents.

use yedit::yaml::emitter::emit_node;
use yedit::yaml::node::NodeData;
use yedit::{Node, Value};

// =============================================================================
// Separator
// =============================================================================

/// Type of separator between output items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Separator {
    /// Newline-separated output (standard mode).
    Newline,
    /// Null-terminated output (for -0 variants).
    Nul,
}

impl Separator {
    pub fn new(nul: bool) -> Self {
        if nul {
            Separator::Nul
        } else {
            Separator::Newline
        }
    }

    /// Get the separator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Newline => "\n",
            Separator::Nul => "\0",
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Text of a node: scalar text as is, collections as block YAML.
pub fn render(node: &Node, indent: usize) -> String {
    match &node.data {
        NodeData::Scalar(s) if node.is_null() => {
            if s.value == "null" || s.value == "~" || s.value.is_empty() {
                String::new()
            } else {
                s.value.clone()
            }
        }
        NodeData::Scalar(s) => s.value.clone(),
        NodeData::Alias(name) => format!("*{}", name),
        _ => emit_node(node, indent),
    }
}

/// Text of a decoded value, rendered like [`render`].
pub fn render_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::List(_) | Value::Map(_) => {
            let opts = yedit::EncodeOptions {
                indent,
                sequence_style: yedit::Style::Block,
                sort_keys: false,
                ..yedit::EncodeOptions::default()
            };
            emit_node(&yedit::yaml::value::encode(value, &opts), indent)
        }
        other => other.to_string(),
    }
}

/// Item text without the trailing newline block output ends with.
fn item(text: String) -> String {
    match text.strip_suffix('\n') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

// =============================================================================
// Output Functions
// =============================================================================

/// Print a sequence of items with the given separator.
pub fn print_items(iter: impl Iterator<Item = String>, sep: Separator) {
    for text in iter {
        print!("{}{}", item(text), sep.as_str());
    }
}

/// Print key-value pairs, each key and value followed by the separator.
pub fn print_kv_items(iter: impl Iterator<Item = (String, String)>, sep: Separator) {
    for (k, v) in iter {
        print!("{}{}", item(k), sep.as_str());
        print!("{}{}", item(v), sep.as_str());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use yedit::Document;

    #[test]
    fn test_separator_as_str() {
        assert_eq!(Separator::new(false).as_str(), "\n");
        assert_eq!(Separator::new(true).as_str(), "\0");
    }

    #[test]
    fn test_render_nodes() {
        let doc = Document::load("s: 'quoted'\nn: ~\nm:\n  a: 1\n").unwrap();
        assert_eq!(render(doc.get_node("s").unwrap(), 2), "quoted");
        assert_eq!(render(doc.get_node("n").unwrap(), 2), "");
        assert_eq!(render(doc.get_node("m").unwrap(), 2), "a: 1\n");
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&Value::Int(3), 2), "3");
        assert_eq!(render_value(&Value::from("x y"), 2), "x y");
        assert_eq!(
            render_value(&Value::List(vec![Value::Int(1), Value::Int(2)]), 2),
            "- 1\n- 2\n"
        );
    }

    #[test]
    fn test_item_strips_one_newline() {
        assert_eq!(item("a: 1\n".to_string()), "a: 1");
        assert_eq!(item("x".to_string()), "x");
    }
}
