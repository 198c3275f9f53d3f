//! Path handling for YAML navigation.
//!
//! A path is written as dot-separated keys, each optionally followed by
//! `[n]` index suffixes: `servers[0].ports[1]`. A path may also start with
//! an index (`[0].name`) to address the items of a sequence-rooted
//! document. `\` escapes the next character, so `a\.b` is the single key
//! `a.b` and `\*` a literal `*` key. In patterns, `*`, `**` and `[*]` are
//! wildcards.

use super::error::Error;
use super::node::{Kind, Node, Style};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(i64),
    /// `*`: any single key (or index, against a sequence)
    AnyKey,
    /// `[*]`: any single index
    AnyIndex,
    /// `**`: any number of segments
    Recursive,
}

impl Segment {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::AnyKey | Segment::AnyIndex | Segment::Recursive)
    }
}

/// A parsed path. The empty path is the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Parse a path or pattern string.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let invalid = |message: String| Error::InvalidPath {
            path: s.to_string(),
            message,
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut literal = false;
        let mut indexed = false;
        let mut chars = s.chars().peekable();

        let flush = |segments: &mut Vec<Segment>, key: &mut String, literal: &mut bool| {
            let segment = match key.as_str() {
                "*" if !*literal => Segment::AnyKey,
                "**" if !*literal => Segment::Recursive,
                _ => Segment::Key(key.clone()),
            };
            segments.push(segment);
            key.clear();
            *literal = false;
        };

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        key.push(escaped);
                        literal = true;
                    }
                }
                '.' => {
                    if !indexed {
                        flush(&mut segments, &mut key, &mut literal);
                    }
                    indexed = false;
                }
                '[' => {
                    if indexed && !key.is_empty() {
                        return Err(invalid("expected '.' or '[' after ']'".to_string()));
                    }
                    if !key.is_empty() || literal {
                        flush(&mut segments, &mut key, &mut literal);
                    }
                    let mut index = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => index.push(c),
                            None => return Err(invalid("unclosed '['".to_string())),
                        }
                    }
                    let segment = match index.trim() {
                        "*" => Segment::AnyIndex,
                        text => text.parse().map(Segment::Index).map_err(|_| {
                            invalid(format!("non-integer index '{}' provided on a sequence", index))
                        })?,
                    };
                    segments.push(segment);
                    indexed = true;
                    if !matches!(chars.peek(), None | Some('.') | Some('[')) {
                        return Err(invalid("expected '.' or '[' after ']'".to_string()));
                    }
                }
                c => key.push(c),
            }
        }
        if !indexed {
            flush(&mut segments, &mut key, &mut literal);
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_wildcards(&self) -> bool {
        self.0.iter().any(Segment::is_wildcard)
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_string()));
        Self(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index as i64));
        Self(segments)
    }

    /// This path followed by `other`.
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Rendered prefix made of the first `n` segments.
    fn prefix(&self, n: usize) -> String {
        Path(self.0[..n].to_vec()).to_string()
    }

    fn ensure_concrete(&self) -> Result<(), Error> {
        if self.has_wildcards() {
            return Err(Error::InvalidPath {
                path: self.to_string(),
                message: "wildcards are only allowed in patterns".to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Path::parse(s)
    }
}

fn escape_key(key: &str, out: &mut String) {
    if key == "*" || key == "**" {
        out.push('\\');
    }
    for c in key.chars() {
        if matches!(c, '.' | '[' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::new();
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    if i > 0 {
                        out.push('.');
                    }
                    escape_key(key, &mut out);
                }
                Segment::AnyKey => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push('*');
                }
                Segment::Recursive => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str("**");
                }
                Segment::Index(n) => out.push_str(&format!("[{}]", n)),
                Segment::AnyIndex => out.push_str("[*]"),
            }
        }
        write!(f, "{}", out)
    }
}

// =============================================================================
// Resolution
// =============================================================================

fn checked_index(index: i64, len: usize, path: &Path, depth: usize) -> Result<usize, Error> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| Error::IndexOutOfBounds {
            path: path.prefix(depth + 1),
            index,
            len,
        })
}

fn unresolvable(path: &Path, depth: usize) -> Error {
    Error::InvalidPath {
        path: path.prefix(depth + 1),
        message: "segment cannot be resolved".to_string(),
    }
}

fn child_mut<'a>(node: &'a mut Node, segment: &Segment) -> Option<&'a mut Node> {
    match segment {
        Segment::Key(key) => node.get_mut(key),
        Segment::Index(index) => {
            let index = usize::try_from(*index).ok()?;
            node.items_mut()?.get_mut(index)
        }
        _ => None,
    }
}

/// Walk `path` from `root` without modifying anything.
pub fn resolve<'a>(root: &'a Node, path: &Path) -> Result<&'a Node, Error> {
    path.ensure_concrete()?;
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match segment {
            Segment::Key(key) => {
                if !current.is_mapping() {
                    return Err(Error::NotAMapping {
                        path: path.prefix(depth + 1),
                    });
                }
                current.get(key).ok_or_else(|| Error::KeyNotFound {
                    path: path.prefix(depth + 1),
                    key: key.clone(),
                })?
            }
            Segment::Index(index) => {
                if !current.is_sequence() {
                    return Err(Error::NotASequence {
                        path: path.prefix(depth + 1),
                    });
                }
                let i = checked_index(*index, current.len(), path, depth)?;
                &current.items()[i]
            }
            _ => return Err(unresolvable(path, depth)),
        };
    }
    Ok(current)
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut Node, path: &Path) -> Result<&'a mut Node, Error> {
    resolve(root, path)?;
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = child_mut(current, segment).ok_or_else(|| unresolvable(path, depth))?;
    }
    Ok(current)
}

/// What a write walk creates for the last segment when it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Null,
    Sequence(Style),
    Mapping(Style),
}

impl Leaf {
    fn node(self) -> Node {
        match self {
            Leaf::Null => Node::null(),
            Leaf::Sequence(style) => Node::sequence(style),
            Leaf::Mapping(style) => Node::mapping(style),
        }
    }
}

/// Dry run of [`resolve_or_create`]: fails exactly when it would, and
/// returns the existing target node if there is one.
pub fn probe<'a>(root: &'a Node, path: &Path) -> Result<Option<&'a Node>, Error> {
    path.ensure_concrete()?;
    let segments = path.segments();
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) => {
                if current.is_sequence() || current.kind() == Kind::Alias {
                    return Err(Error::NotAMapping {
                        path: path.prefix(depth + 1),
                    });
                }
                match current.get(key) {
                    Some(child) => current = child,
                    None => return creatable(path, depth),
                }
            }
            Segment::Index(index) => {
                if !current.is_sequence() {
                    return Err(Error::NotASequence {
                        path: path.prefix(depth + 1),
                    });
                }
                let i = checked_index(*index, current.len(), path, depth)?;
                current = &current.items()[i];
            }
            _ => return Err(unresolvable(path, depth)),
        }
    }
    Ok(Some(current))
}

/// Keys from `depth` on are missing; they can be created unless an index
/// has to be followed below them.
fn creatable<'a>(path: &Path, depth: usize) -> Result<Option<&'a Node>, Error> {
    let segments = path.segments();
    if segments[depth + 1..]
        .iter()
        .any(|s| matches!(s, Segment::Index(_)))
    {
        if let Segment::Key(key) = &segments[depth] {
            return Err(Error::KeyNotFound {
                path: path.prefix(depth + 1),
                key: key.clone(),
            });
        }
    }
    Ok(None)
}

/// Walk `path`, creating missing mapping keys and turning scalars met on
/// the way into mappings. A missing last segment is created as `leaf`.
/// Nothing is modified when the walk fails.
pub fn resolve_or_create<'a>(
    root: &'a mut Node,
    path: &Path,
    leaf: Leaf,
) -> Result<&'a mut Node, Error> {
    probe(root, path)?;
    let segments = path.segments();
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        current = match segment {
            Segment::Key(key) => {
                if !current.is_mapping() {
                    debug!("promoting scalar at '{}' to a mapping", path.prefix(depth));
                    current.promote(Kind::Mapping, Style::Block);
                }
                if current.get(key).is_none() {
                    debug!("creating '{}'", path.prefix(depth + 1));
                    let child = if last {
                        leaf.node()
                    } else {
                        Node::mapping(Style::Block)
                    };
                    current.insert(key, child);
                }
                current.get_mut(key).ok_or_else(|| unresolvable(path, depth))?
            }
            _ => child_mut(current, segment).ok_or_else(|| unresolvable(path, depth))?,
        };
    }
    Ok(current)
}

// =============================================================================
// Unit Tests
// =============================================================================
