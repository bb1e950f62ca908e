//! Static lineage naming rules.
//!
//! Every cell name encodes its division history, so the parent of a cell and the
//! side it occupies under that parent are a pure function of the name.

use crate::error::{LineageError, Result};

/// Name of the founder cell.
pub const ROOT_NAME: &str = "P0";

/// Number of zero samples given to each skeleton ancestor.
pub const SKELETON_SERIES_LEN: usize = 5;

/// Ancestors that are always present, so sparse data still yields a connected tree.
/// Listed parents-first.
pub const SKELETON: [&str; 7] = ["P0", "AB", "P1", "ABa", "ABp", "EMS", "P2"];

/// Cells labelled with their own rules in the diagram.
pub const LEADER_CELLS: [&str; 15] = [
    "P0", "P1", "P2", "P3", "P4", "AB", "ABa", "ABp", "EMS", "E", "MS", "C", "D", "Z2", "Z3",
];

/// Founder-line divisions that do not follow the suffix rule: `(left, right, parent)`.
const EXPLICIT_DIVISIONS: [(&str, &str, &str); 6] = [
    ("Z2", "Z3", "P4"),
    ("D", "P4", "P3"),
    ("C", "P3", "P2"),
    ("MS", "E", "EMS"),
    ("EMS", "P2", "P1"),
    ("AB", "P1", "P0"),
];

/// Suffix pairs of the generic rule, `(left, right)`.
const SUFFIX_PAIRS: [(char, char); 3] = [('a', 'p'), ('l', 'r'), ('d', 'v')];

/// Child slot under the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Left,
    Right,
}

pub fn is_leader(name: &str) -> bool {
    LEADER_CELLS.contains(&name)
}

/// Resolve the parent of `name` and the slot it occupies.
///
/// Returns `Ok(None)` for the founder cell.
pub fn resolve_parent(name: &str) -> Result<Option<(String, Branch)>> {
    if name == ROOT_NAME {
        return Ok(None);
    }

    for (left, right, parent) in EXPLICIT_DIVISIONS {
        if name == left {
            return Ok(Some((parent.to_string(), Branch::Left)));
        }
        if name == right {
            return Ok(Some((parent.to_string(), Branch::Right)));
        }
    }

    let unresolved = || LineageError::LineageResolution {
        name: name.to_string(),
    };

    let last = name.chars().last().ok_or_else(unresolved)?;
    let parent = &name[..name.len() - last.len_utf8()];
    if parent.is_empty() {
        return Err(unresolved());
    }

    for (left, right) in SUFFIX_PAIRS {
        if last == left {
            return Ok(Some((parent.to_string(), Branch::Left)));
        }
        if last == right {
            return Ok(Some((parent.to_string(), Branch::Right)));
        }
    }

    Err(unresolved())
}
