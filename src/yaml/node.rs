//! Document tree.
//!
//! A [`Node`] owns its children. Besides the data, each node keeps the
//! comments attached to it and the formatting trivia needed to print it back
//! exactly as it was read: spacing around flow items, the gap after a `-`,
//! the indentation offset of block children and the source text of scalars.
//! Copying formatting from one node to another is always an explicit field
//! copy ([`Node::adopt_position`]); nodes are never shared.

use std::fmt;

/// Node kind, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Scalar,
    Sequence,
    Mapping,
    Alias,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar => write!(f, "scalar"),
            Kind::Sequence => write!(f, "sequence"),
            Kind::Mapping => write!(f, "mapping"),
            Kind::Alias => write!(f, "alias"),
        }
    }
}

/// Collection rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Indented lines
    #[default]
    Block,
    /// Bracketed inline
    Flow,
}

/// Resolved type of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    String,
    Int,
    Float,
    Bool,
    Null,
}

impl Tag {
    pub fn name(&self) -> &'static str {
        match self {
            Tag::String => "string",
            Tag::Int => "int",
            Tag::Float => "float",
            Tag::Bool => "bool",
            Tag::Null => "null",
        }
    }
}

/// How a scalar is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// Body of a `|` or `>` scalar, kept line for line.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBody {
    /// Indicator text, e.g. `|-` or `>2`
    pub header: String,
    /// Raw body lines, with their source indentation
    pub lines: Vec<String>,
    /// Indentation of the line that owned the header
    pub base_indent: usize,
}

/// Scalar payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub tag: Tag,
    /// Decoded text (quotes and escapes removed)
    pub value: String,
    pub style: ScalarStyle,
    /// Exact source text; `None` for synthesized scalars
    pub raw: Option<String>,
    pub block: Option<Box<BlockBody>>,
}

impl Scalar {
    pub fn new(tag: Tag, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
            style: ScalarStyle::Plain,
            raw: None,
            block: None,
        }
    }
}

/// Comments attached to a node. Lines are kept verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comments {
    /// Lines before the node (comments and blank lines)
    pub head: Vec<String>,
    /// Trailing comment on the node's line, starting at `#`
    pub inline: Option<String>,
    /// Comment lines after the node
    pub foot: Vec<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.inline.is_none() && self.foot.is_empty()
    }
}

/// Formatting trivia.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// Whitespace before the node: the gap after `-` in block sequences, or
    /// the text after `[`, `{` or `,` in flow collections
    pub lead: String,
    /// Whitespace after the node, before `,` or the closing bracket (flow only)
    pub trail: String,
    /// Whitespace between the node's text and its inline comment
    pub eol_gap: String,
    /// Tag or anchor token written before the node, and the gap after it
    pub props: Option<(String, String)>,
    /// Indentation of block children relative to the parent line
    pub offset: Option<usize>,
    /// Block collection inside a block sequence starts on the `-` line
    pub compact: bool,
    /// Flow collection ends with `,`
    pub trailing_comma: bool,
    /// Text before the closing bracket after a trailing comma, or the inside
    /// of an empty flow collection
    pub tail: String,
}

/// One mapping pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Always a scalar node; carries the entry's head comments
    pub key: Node,
    /// Text between key and value, e.g. `": "`
    pub colon: String,
    pub value: Node,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: Node) -> Self {
        Self {
            key: Node::string(key),
            colon: ": ".to_string(),
            value,
        }
    }

    /// Key text used for lookup.
    pub fn key_str(&self) -> &str {
        match &self.key.data {
            NodeData::Scalar(s) => &s.value,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Vec<Entry>),
    Alias(String),
}

/// A document tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub style: Style,
    pub comments: Comments,
    pub layout: Layout,
}

impl Node {
    fn with_data(data: NodeData, style: Style) -> Self {
        let compact = !matches!(data, NodeData::Scalar(_));
        Self {
            data,
            style,
            comments: Comments::default(),
            layout: Layout {
                compact,
                ..Layout::default()
            },
        }
    }

    pub fn scalar(scalar: Scalar) -> Self {
        Self::with_data(NodeData::Scalar(scalar), Style::Block)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::scalar(Scalar::new(Tag::String, value))
    }

    pub fn null() -> Self {
        Self::scalar(Scalar::new(Tag::Null, "null"))
    }

    pub fn mapping(style: Style) -> Self {
        Self::with_data(NodeData::Mapping(Vec::new()), style)
    }

    pub fn sequence(style: Style) -> Self {
        Self::with_data(NodeData::Sequence(Vec::new()), style)
    }

    pub fn kind(&self) -> Kind {
        match self.data {
            NodeData::Scalar(_) => Kind::Scalar,
            NodeData::Sequence(_) => Kind::Sequence,
            NodeData::Mapping(_) => Kind::Mapping,
            NodeData::Alias(_) => Kind::Alias,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.data {
            NodeData::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn tag(&self) -> Option<Tag> {
        self.as_scalar().map(|s| s.tag)
    }

    pub fn is_null(&self) -> bool {
        self.tag() == Some(Tag::Null)
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.data, NodeData::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.data, NodeData::Sequence(_))
    }

    pub fn is_collection(&self) -> bool {
        self.is_mapping() || self.is_sequence()
    }

    /// Number of items or entries; zero for scalars.
    pub fn len(&self) -> usize {
        match &self.data {
            NodeData::Sequence(items) => items.len(),
            NodeData::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Explicit tag written on the node, like `!!str` or `!custom`.
    pub fn explicit_tag(&self) -> Option<&str> {
        self.layout
            .props
            .as_ref()
            .map(|(token, _)| token.as_str())
            .filter(|token| token.starts_with('!'))
    }

    // ---------------------------------------------------------------------
    // Mapping access
    // ---------------------------------------------------------------------

    pub fn entries(&self) -> &[Entry] {
        match &self.data {
            NodeData::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries()
            .iter()
            .find(|e| e.key_str() == key)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        match &mut self.data {
            NodeData::Mapping(entries) => entries
                .iter_mut()
                .find(|e| e.key_str() == key)
                .map(|e| &mut e.value),
            _ => None,
        }
    }

    /// Set `key` to `value`. An existing value hands its comments and
    /// position over to the new one; a new key is appended after the others.
    pub fn insert(&mut self, key: &str, mut value: Node) {
        let style = self.style;
        if let NodeData::Mapping(entries) = &mut self.data {
            if let Some(entry) = entries.iter_mut().find(|e| e.key_str() == key) {
                value.adopt_position(&entry.value);
                entry.value = value;
                return;
            }
            let mut entry = Entry::new(key, value);
            if style == Style::Flow {
                if entries.is_empty() {
                    self.layout.tail.clear();
                }
                place_flow_entry(entries, &mut entry);
            }
            entries.push(entry);
        }
    }

    /// Append a ready-made entry (used by merge, which copies donor keys).
    pub fn push_entry(&mut self, mut entry: Entry) {
        let style = self.style;
        if let NodeData::Mapping(entries) = &mut self.data {
            if style == Style::Flow {
                if entries.is_empty() {
                    self.layout.tail.clear();
                }
                entry.key.layout.lead.clear();
                entry.value.layout.trail.clear();
                place_flow_entry(entries, &mut entry);
            }
            entries.push(entry);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let style = self.style;
        let entries = match &mut self.data {
            NodeData::Mapping(entries) => entries,
            _ => return None,
        };
        let pos = entries.iter().position(|e| e.key_str() == key)?;
        let removed = entries.remove(pos);
        if style == Style::Flow {
            let len = entries.len();
            if pos == 0 && len > 0 {
                entries[0].key.layout.lead = removed.key.layout.lead.clone();
            }
            if pos == len && len > 0 {
                entries[len - 1].value.layout.trail = removed.value.layout.trail.clone();
            }
        }
        Some(removed.value)
    }

    // ---------------------------------------------------------------------
    // Sequence access
    // ---------------------------------------------------------------------

    pub fn items(&self) -> &[Node] {
        match &self.data {
            NodeData::Sequence(items) => items,
            _ => &[],
        }
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.data {
            NodeData::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Append an item, giving it the spacing its siblings use.
    pub fn push(&mut self, item: Node) {
        let len = self.len();
        self.insert_item(len, item);
    }

    /// Insert an item at `index` (`index <= len`).
    pub fn insert_item(&mut self, index: usize, mut item: Node) {
        let style = self.style;
        if style == Style::Flow && self.is_empty() {
            self.layout.tail.clear();
        }
        let items = match &mut self.data {
            NodeData::Sequence(items) => items,
            _ => return,
        };
        let len = items.len();
        match style {
            Style::Block => {
                item.layout.lead = items
                    .first()
                    .map(|i| i.layout.lead.clone())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| " ".to_string());
            }
            Style::Flow if len == 0 => {
                item.layout.lead.clear();
                item.layout.trail.clear();
            }
            Style::Flow => {
                let sep = flow_separator(items.iter().map(|i| i.layout.lead.as_str()));
                let inner_trail = if len >= 2 {
                    items[0].layout.trail.clone()
                } else {
                    String::new()
                };
                if index == 0 {
                    item.layout.lead = std::mem::replace(&mut items[0].layout.lead, sep);
                    item.layout.trail = inner_trail;
                } else if index == len {
                    item.layout.lead = sep;
                    item.layout.trail =
                        std::mem::replace(&mut items[len - 1].layout.trail, inner_trail);
                } else {
                    item.layout.lead = sep;
                    item.layout.trail = inner_trail;
                }
            }
        }
        items.insert(index, item);
    }

    /// Remove the item at `index` (`index < len`).
    pub fn remove_item(&mut self, index: usize) -> Option<Node> {
        let style = self.style;
        let items = self.items_mut()?;
        if index >= items.len() {
            return None;
        }
        let removed = items.remove(index);
        let len = items.len();
        if style == Style::Flow && len > 0 {
            if index == 0 {
                items[0].layout.lead = removed.layout.lead.clone();
            }
            if index == len {
                items[len - 1].layout.trail = removed.layout.trail.clone();
            }
        }
        Some(removed)
    }

    /// Replace the item at `index`, keeping the old item's comments.
    pub fn replace_item(&mut self, index: usize, mut item: Node) -> Option<Node> {
        let items = self.items_mut()?;
        let slot = items.get_mut(index)?;
        item.adopt_position(slot);
        Some(std::mem::replace(slot, item))
    }

    // ---------------------------------------------------------------------
    // Formatting
    // ---------------------------------------------------------------------

    /// Take over comments and position trivia from the node this one
    /// replaces.
    pub fn adopt_position(&mut self, old: &Node) {
        self.comments = old.comments.clone();
        self.layout.lead = old.layout.lead.clone();
        self.layout.trail = old.layout.trail.clone();
        self.layout.eol_gap = old.layout.eol_gap.clone();
        if self.is_collection() && old.is_collection() {
            self.layout.compact = old.layout.compact;
            if old.layout.offset.is_some() {
                self.layout.offset = old.layout.offset;
            }
        }
    }

    /// Change the collection style. Children lose the spacing that only
    /// made sense in the old style.
    pub fn set_style(&mut self, style: Style) {
        if self.style == style {
            return;
        }
        self.style = style;
        self.layout.trailing_comma = false;
        self.layout.tail.clear();
        match &mut self.data {
            NodeData::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    item.layout.lead = default_lead(style, i);
                    item.layout.trail.clear();
                }
            }
            NodeData::Mapping(entries) => {
                for (i, entry) in entries.iter_mut().enumerate() {
                    entry.key.layout.lead = match style {
                        Style::Flow => default_lead(style, i),
                        Style::Block => String::new(),
                    };
                    entry.value.layout.trail.clear();
                    entry.colon = ": ".to_string();
                }
            }
            _ => {}
        }
    }

    /// Promote a scalar into an empty collection of the given kind,
    /// keeping its comments and position.
    pub(crate) fn promote(&mut self, kind: Kind, style: Style) {
        let mut node = match kind {
            Kind::Sequence => Node::sequence(style),
            _ => Node::mapping(style),
        };
        node.adopt_position(self);
        *self = node;
    }
}

fn default_lead(style: Style, index: usize) -> String {
    match (style, index) {
        (Style::Block, _) => " ".to_string(),
        (Style::Flow, 0) => String::new(),
        (Style::Flow, _) => " ".to_string(),
    }
}

/// Separator spacing used between flow items: what the second item uses,
/// else a single space.
fn flow_separator<'a>(mut leads: impl Iterator<Item = &'a str>) -> String {
    leads.nth(1).unwrap_or(" ").to_string()
}

fn place_flow_entry(entries: &mut [Entry], entry: &mut Entry) {
    let len = entries.len();
    if len == 0 {
        return;
    }
    entry.key.layout.lead = flow_separator(entries.iter().map(|e| e.key.layout.lead.as_str()));
    entry.colon = entries[len - 1].colon.clone();
    let inner_trail = if len >= 2 {
        entries[0].value.layout.trail.clone()
    } else {
        String::new()
    };
    entry.value.layout.trail =
        std::mem::replace(&mut entries[len - 1].value.layout.trail, inner_trail);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Node {
        Node::scalar(Scalar::new(Tag::Int, v.to_string()))
    }

    #[test]
    fn test_mapping_insert_and_get() {
        let mut map = Node::mapping(Style::Block);
        map.insert("a", int(1));
        map.insert("b", int(2));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b").and_then(|n| n.as_scalar()).map(|s| s.value.as_str()), Some("2"));
        assert!(map.get("c").is_none());
    }

    #[test]
    fn test_insert_existing_key_keeps_comments() {
        let mut map = Node::mapping(Style::Block);
        let mut old = int(1);
        old.comments.inline = Some("# keep me".into());
        map.insert("a", old);
        map.insert("a", int(2));
        let value = map.get("a").unwrap();
        assert_eq!(value.comments.inline.as_deref(), Some("# keep me"));
        assert_eq!(value.as_scalar().unwrap().value, "2");
    }

    #[test]
    fn test_flow_push_copies_separator() {
        let mut seq = Node::sequence(Style::Flow);
        seq.push(int(1));
        seq.push(int(2));
        assert_eq!(seq.items()[0].layout.lead, "");
        assert_eq!(seq.items()[1].layout.lead, " ");

        seq.items_mut().unwrap()[1].layout.lead.clear();
        seq.push(int(3));
        assert_eq!(seq.items()[2].layout.lead, "");
    }

    #[test]
    fn test_flow_push_moves_closing_padding() {
        let mut seq = Node::sequence(Style::Flow);
        seq.push(int(1));
        seq.push(int(2));
        seq.items_mut().unwrap()[0].layout.lead = " ".into();
        seq.items_mut().unwrap()[1].layout.trail = " ".into();
        seq.push(int(3));
        assert_eq!(seq.items()[1].layout.trail, "");
        assert_eq!(seq.items()[2].layout.trail, " ");
    }

    #[test]
    fn test_remove_first_flow_item_hands_over_lead() {
        let mut seq = Node::sequence(Style::Flow);
        for v in 1..=3 {
            seq.push(int(v));
        }
        seq.items_mut().unwrap()[0].layout.lead = " ".into();
        let removed = seq.remove_item(0).unwrap();
        assert_eq!(removed.as_scalar().unwrap().value, "1");
        assert_eq!(seq.items()[0].layout.lead, " ");
    }

    #[test]
    fn test_set_style_resets_item_spacing() {
        let mut seq = Node::sequence(Style::Block);
        seq.push(int(1));
        seq.push(int(2));
        seq.set_style(Style::Flow);
        assert_eq!(seq.items()[0].layout.lead, "");
        assert_eq!(seq.items()[1].layout.lead, " ");
    }

    #[test]
    fn test_promote_keeps_comments() {
        let mut node = Node::null();
        node.comments.inline = Some("# note".into());
        node.promote(Kind::Mapping, Style::Block);
        assert!(node.is_mapping());
        assert_eq!(node.comments.inline.as_deref(), Some("# note"));
    }
}
