//! Tree to text.
//!
//! Nodes that came from the parser carry their source text and spacing and
//! are written back unchanged. Nodes built by the engine have none and get
//! the default layout.

use super::node::{Entry, Node, NodeData, Scalar, Style, Tag};
use super::scalar;

/// Render a whole document.
pub fn emit_document(
    head: &[String],
    root: &Node,
    margin: usize,
    indent: usize,
    crlf: bool,
) -> String {
    let mut emitter = Emitter::new(indent);
    emitter.lines(head);
    let empty_root = root.style == Style::Block && root.is_mapping() && root.is_empty();
    if !empty_root {
        emitter.root(root, margin);
    }
    // A block root writes its own foot
    if !is_block(root) {
        emitter.lines(&root.comments.foot);
    }
    if crlf {
        emitter.out.replace('\n', "\r\n")
    } else {
        emitter.out
    }
}

/// Render a node on its own, as block text for collections and as a bare
/// scalar otherwise. Used to print sub-trees.
pub fn emit_node(node: &Node, indent: usize) -> String {
    let mut emitter = Emitter::new(indent);
    emitter.root(node, 0);
    emitter.out
}

/// Render a node on a single line, in flow style.
pub fn emit_flow(node: &Node) -> String {
    let mut out = String::new();
    inline(&mut out, node, true);
    out
}

struct Emitter {
    out: String,
    /// Default indentation of new block children
    indent: usize,
}

impl Emitter {
    fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    fn lines(&mut self, lines: &[String]) {
        for line in lines {
            self.out.push_str(line);
            self.out.push('\n');
        }
    }

    fn spaces(&mut self, n: usize) {
        self.out.extend(std::iter::repeat(' ').take(n));
    }

    fn root(&mut self, root: &Node, margin: usize) {
        if is_block(root) {
            self.block(root, margin, false);
        } else {
            self.spaces(margin);
            self.props(root);
            inline(&mut self.out, root, false);
            self.eol(root);
            self.block_body(root, margin);
        }
    }

    fn block(&mut self, node: &Node, indent: usize, first_inline: bool) {
        match &node.data {
            NodeData::Mapping(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    self.entry(entry, indent, first_inline && i == 0);
                }
            }
            NodeData::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.item(item, indent, first_inline && i == 0);
                }
            }
            _ => {}
        }
        self.lines(&node.comments.foot);
    }

    fn entry(&mut self, entry: &Entry, indent: usize, first_inline: bool) {
        if !first_inline {
            self.lines(&entry.key.comments.head);
            self.spaces(indent);
        }
        self.props(&entry.key);
        key(&mut self.out, &entry.key, false);

        let value = &entry.value;
        if is_block(value) {
            if value.layout.props.is_some() {
                self.out.push_str(&entry.colon);
                if !entry.colon.ends_with([' ', '\t']) {
                    self.out.push(' ');
                }
                self.props_token(value);
            } else {
                self.out.push_str(entry.colon.trim_end_matches([' ', '\t']));
            }
            self.eol(value);
            let offset = value.layout.offset.unwrap_or(self.indent);
            self.block(value, indent + offset, false);
            return;
        }
        self.out.push_str(&entry.colon);
        if !is_implicit_null(value) || value.layout.props.is_some() {
            if !entry.colon.ends_with([' ', '\t']) {
                self.out.push(' ');
            }
            self.props(value);
            inline(&mut self.out, value, false);
        }
        self.eol(value);
        self.block_body(value, indent);
        self.lines(&value.comments.foot);
    }

    fn item(&mut self, item: &Node, indent: usize, first_inline: bool) {
        if !first_inline {
            self.lines(&item.comments.head);
            self.spaces(indent);
        }
        self.out.push('-');
        let lead = if item.layout.lead.is_empty() {
            " "
        } else {
            item.layout.lead.as_str()
        };

        if is_block(item) {
            let compact = item.layout.compact
                && item.layout.props.is_none()
                && item.comments.inline.is_none()
                && first_child_head_is_empty(item);
            if compact {
                self.out.push_str(lead);
                self.block(item, indent + 1 + lead.len(), true);
            } else {
                if item.layout.props.is_some() {
                    self.out.push_str(lead);
                    self.props_token(item);
                }
                self.eol(item);
                let offset = item.layout.offset.unwrap_or(self.indent);
                self.block(item, indent + offset, false);
            }
            return;
        }
        if !is_implicit_null(item) || item.layout.props.is_some() {
            self.out.push_str(lead);
            self.props(item);
            inline(&mut self.out, item, false);
        }
        self.eol(item);
        self.block_body(item, indent);
        self.lines(&item.comments.foot);
    }

    fn props(&mut self, node: &Node) {
        if let Some((token, gap)) = &node.layout.props {
            self.out.push_str(token);
            self.out.push_str(if gap.is_empty() { " " } else { gap });
        }
    }

    fn props_token(&mut self, node: &Node) {
        if let Some((token, _)) = &node.layout.props {
            self.out.push_str(token);
        }
    }

    /// Inline comment and line break.
    fn eol(&mut self, node: &Node) {
        match &node.comments.inline {
            Some(comment) => {
                let gap = &node.layout.eol_gap;
                let at_line_start = self.out.is_empty() || self.out.ends_with('\n');
                if gap.is_empty() && !at_line_start {
                    self.out.push(' ');
                } else {
                    self.out.push_str(gap);
                }
                self.out.push_str(comment);
            }
            None => self.out.push_str(&node.layout.eol_gap),
        }
        self.out.push('\n');
    }

    /// Body lines of a literal or folded scalar, re-indented for `indent`.
    fn block_body(&mut self, node: &Node, indent: usize) {
        let body = match &node.data {
            NodeData::Scalar(Scalar {
                block: Some(body), ..
            }) => body,
            _ => return,
        };
        for line in &body.lines {
            if line.trim().is_empty() || indent == body.base_indent {
                self.out.push_str(line);
            } else if indent > body.base_indent {
                self.spaces(indent - body.base_indent);
                self.out.push_str(line);
            } else {
                let strip = (body.base_indent - indent).min(line.len() - line.trim_start_matches(' ').len());
                self.out.push_str(&line[strip..]);
            }
            self.out.push('\n');
        }
    }
}

/// Non-empty block collection: written over several lines.
fn is_block(node: &Node) -> bool {
    node.style == Style::Block && node.is_collection() && !node.is_empty()
}

fn is_implicit_null(node: &Node) -> bool {
    matches!(&node.data, NodeData::Scalar(s) if s.tag == Tag::Null && s.raw.as_deref() == Some(""))
}

fn first_child_head_is_empty(node: &Node) -> bool {
    match &node.data {
        NodeData::Mapping(entries) => entries
            .first()
            .map_or(true, |e| e.key.comments.head.is_empty()),
        NodeData::Sequence(items) => items.first().map_or(true, |i| i.comments.head.is_empty()),
        _ => true,
    }
}

fn key(out: &mut String, key: &Node, in_flow: bool) {
    match &key.data {
        NodeData::Scalar(s) => match &s.raw {
            Some(raw) => out.push_str(raw),
            None if scalar::needs_quotes(&s.value, in_flow) => {
                out.push_str(&scalar::quote_double(&s.value))
            }
            None => out.push_str(&s.value),
        },
        _ => inline(out, key, in_flow),
    }
}

/// Text of a node that fits on the current line: a scalar, an alias, a
/// block scalar header or a flow collection.
fn inline(out: &mut String, node: &Node, in_flow: bool) {
    match &node.data {
        NodeData::Scalar(s) => scalar_text(out, s, in_flow),
        NodeData::Alias(name) => {
            out.push('*');
            out.push_str(name);
        }
        NodeData::Sequence(items) => {
            let block = node.style == Style::Block;
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                flow_lead(out, &item.layout.lead, block, i);
                flow_props(out, item);
                inline(out, item, true);
                if !block {
                    out.push_str(&item.layout.trail);
                }
            }
            flow_close(out, node, ']');
        }
        NodeData::Mapping(entries) => {
            let block = node.style == Style::Block;
            out.push('{');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                flow_lead(out, &entry.key.layout.lead, block, i);
                key(out, &entry.key, true);
                if block {
                    out.push_str(": ");
                } else if entry.colon.is_empty() && !is_implicit_null(&entry.value) {
                    out.push_str(": ");
                } else {
                    out.push_str(&entry.colon);
                }
                flow_props(out, &entry.value);
                inline(out, &entry.value, true);
                if !block {
                    out.push_str(&entry.value.layout.trail);
                }
            }
            flow_close(out, node, '}');
        }
    }
}

fn flow_lead(out: &mut String, lead: &str, block: bool, index: usize) {
    if block {
        if index > 0 {
            out.push(' ');
        }
    } else {
        out.push_str(lead);
    }
}

fn flow_props(out: &mut String, node: &Node) {
    if let Some((token, gap)) = &node.layout.props {
        out.push_str(token);
        out.push_str(if gap.is_empty() { " " } else { gap });
    }
}

fn flow_close(out: &mut String, node: &Node, close: char) {
    if node.style == Style::Flow {
        if node.layout.trailing_comma {
            out.push(',');
        }
        out.push_str(&node.layout.tail);
    }
    out.push(close);
}

fn scalar_text(out: &mut String, s: &Scalar, in_flow: bool) {
    if s.block.is_some() && in_flow {
        out.push_str(&scalar::quote_double(&s.value));
        return;
    }
    if let Some(raw) = &s.raw {
        out.push_str(raw);
        return;
    }
    match s.tag {
        Tag::String if scalar::needs_quotes(&s.value, in_flow) => {
            out.push_str(&scalar::quote_double(&s.value))
        }
        _ => out.push_str(&s.value),
    }
}
