//! Merging one document tree into another for the `apply` command.
//!
//! Mappings merge key by key: keys only the donor has are appended in the
//! donor's order, keys both have are merged recursively. Anything else,
//! sequences included, is replaced by a deep copy of the donor's node, which
//! keeps the comments and position of the node it replaces.

use super::error::Error;
use super::node::{Node, Style};
use super::path::{self, Leaf, Path};
use log::{debug, trace};

// =============================================================================
// Merge Operations
// =============================================================================

fn merge_nodes(base: &mut Node, donor: &Node, path: &Path) {
    if base.is_mapping() && donor.is_mapping() {
        for entry in donor.entries() {
            let key = entry.key_str();
            match base.get_mut(key) {
                Some(existing) => merge_nodes(existing, &entry.value, &path.child_key(key)),
                None => {
                    debug!("merge: adding '{}'", path.child_key(key));
                    base.push_entry(entry.clone());
                }
            }
        }
        return;
    }
    trace!("merge: replacing '{}'", path);
    replace(base, donor);
}

fn replace(base: &mut Node, donor: &Node) {
    let mut node = donor.clone();
    node.adopt_position(base);
    if node.is_sequence() && base.is_sequence() {
        node.set_style(base.style);
    }
    *base = node;
}

/// Merge `donor` into `base` in place. A missing donor is `NilDocument`.
pub fn merge_into(base: &mut Node, donor: Option<&Node>) -> Result<(), Error> {
    let donor = donor.ok_or(Error::NilDocument)?;
    merge_nodes(base, donor, &Path::root());
    Ok(())
}

/// Merge `donor` into the node at `path`, creating it as an empty mapping
/// first when it does not exist.
pub fn merge_at(root: &mut Node, path: &Path, donor: Option<&Node>) -> Result<(), Error> {
    let donor = donor.ok_or(Error::NilDocument)?;
    let target = path::resolve_or_create(root, path, Leaf::Mapping(Style::Block))?;
    merge_nodes(target, donor, path);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
