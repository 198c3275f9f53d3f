//! Wildcard patterns over document paths.
//!
//! `*` matches one key (or one index under a sequence), `[*]` one index and
//! `**` any number of segments. Matching walks the tree and stops descending
//! as soon as the path built so far can no longer lead to a match.

use super::error::Error;
use super::mutation;
use super::node::{Node, NodeData};
use super::path::{Path, Segment};
use super::value::{decode, EncodeOptions, Value};
use indexmap::IndexMap;
use log::{debug, trace};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(Path);

impl Pattern {
    pub fn parse(s: &str) -> Result<Self, Error> {
        Path::parse(s).map(Pattern)
    }

    /// Whether the concrete `path` matches the whole pattern.
    pub fn matches(&self, path: &Path) -> bool {
        match_segments(self.0.segments(), path.segments())
    }

    /// Whether some extension of `prefix` could still match.
    fn admits_prefix(&self, prefix: &[Segment]) -> bool {
        prefix_matches(self.0.segments(), prefix)
    }

    /// Every matching node below `root`, in document order. The root
    /// itself is never a match.
    pub fn find<'a>(&self, root: &'a Node) -> Vec<(Path, &'a Node)> {
        let mut found = Vec::new();
        let mut prefix = Vec::new();
        self.walk(root, &mut prefix, &mut found);
        trace!("pattern '{}' matched {} node(s)", self, found.len());
        found
    }

    fn walk<'a>(
        &self,
        node: &'a Node,
        prefix: &mut Vec<Segment>,
        found: &mut Vec<(Path, &'a Node)>,
    ) {
        let children: Vec<(Segment, &'a Node)> = match &node.data {
            NodeData::Mapping(entries) => entries
                .iter()
                .map(|e| (Segment::Key(e.key_str().to_string()), &e.value))
                .collect(),
            NodeData::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (Segment::Index(i as i64), item))
                .collect(),
            _ => return,
        };
        for (segment, child) in children {
            prefix.push(segment);
            if self.admits_prefix(prefix) {
                let path = Path::new(prefix.clone());
                if self.matches(&path) {
                    found.push((path, child));
                }
                self.walk(child, prefix, found);
            }
            prefix.pop();
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn segment_matches(pattern: &Segment, concrete: &Segment) -> bool {
    match (pattern, concrete) {
        (Segment::AnyKey, Segment::Key(_) | Segment::Index(_)) => true,
        (Segment::AnyIndex, Segment::Index(_)) => true,
        (Segment::Key(a), Segment::Key(b)) => a == b,
        (Segment::Index(a), Segment::Index(b)) => a == b,
        _ => false,
    }
}

fn match_segments(pattern: &[Segment], path: &[Segment]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Recursive, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment_matches(segment, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn prefix_matches(pattern: &[Segment], prefix: &[Segment]) -> bool {
    match (pattern.split_first(), prefix.split_first()) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some((Segment::Recursive, _)), Some(_)) => true,
        (Some((segment, rest)), Some((head, tail))) => {
            segment_matches(segment, head) && prefix_matches(rest, tail)
        }
    }
}

// =============================================================================
// Bulk operations
// =============================================================================

/// Decoded value of every match, keyed by its concrete path.
pub fn get_all(root: &Node, pattern: &Pattern) -> Result<IndexMap<String, Value>, Error> {
    pattern
        .find(root)
        .into_iter()
        .map(|(path, node)| decode(node, &path).map(|v| (path.to_string(), v)))
        .collect()
}

/// Concrete paths of every match, sorted.
pub fn get_keys(root: &Node, pattern: &Pattern) -> Vec<String> {
    let mut keys: Vec<String> = pattern
        .find(root)
        .into_iter()
        .map(|(path, _)| path.to_string())
        .collect();
    keys.sort();
    keys
}

/// Set every match to `value`. Matches nested inside another match are
/// replaced along with it and not counted. Returns the number of nodes set.
pub fn set_all(
    root: &mut Node,
    pattern: &Pattern,
    value: &Value,
    opts: &EncodeOptions,
) -> Result<usize, Error> {
    let paths: Vec<Path> = pattern.find(root).into_iter().map(|(p, _)| p).collect();
    let targets: Vec<&Path> = paths
        .iter()
        .filter(|p| !paths.iter().any(|other| other.is_ancestor_of(p)))
        .collect();
    for path in &targets {
        mutation::set(root, path, value, opts)?;
    }
    debug!("set {} match(es) of '{}'", targets.len(), pattern);
    Ok(targets.len())
}

// =============================================================================
// Unit Tests
// =============================================================================
