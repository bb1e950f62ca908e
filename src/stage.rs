//! Choosing the end timepoint of the reference table.

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::records::{group_by_cell, Record};
use crate::topology::ROOT_NAME;
use crate::tree::LineageTree;

/// Highest timepoint the cell-stage search will probe; it also starts there.
pub const STAGE_SEARCH_CEILING: u32 = 130;

/// How much of the reference table is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trim {
    #[default]
    Full,
    /// Keep rows up to and including this timepoint.
    EndTimepoint(u32),
    /// Find the timepoint whose tree has this many leaves.
    CellStage(usize),
}

/// Resolve a trim request into an end timepoint (`None` keeps everything).
///
/// A zero end timepoint or cell stage counts as unset.
pub fn resolve_end_timepoint(records: &[Record], trim: Trim) -> Result<Option<u32>> {
    match trim {
        Trim::Full | Trim::EndTimepoint(0) | Trim::CellStage(0) => Ok(None),
        Trim::EndTimepoint(end) => Ok(Some(end)),
        Trim::CellStage(target) => search_cell_stage(records, target).map(Some),
    }
}

/// Walk timepoints from the ceiling toward the requested leaf count.
///
/// Stops on an exact match, on a revisited timepoint, or at the edge of `[1, ceiling]`,
/// then returns the visited timepoint closest to `target` (earliest visit on ties).
pub fn search_cell_stage(records: &[Record], target: usize) -> Result<u32> {
    let mut distance: FxHashMap<u32, usize> = FxHashMap::default();
    let mut visits: Vec<u32> = Vec::new();
    let mut timepoint = STAGE_SEARCH_CEILING;

    loop {
        if distance.contains_key(&timepoint) {
            break;
        }

        let tree = LineageTree::build(&group_by_cell(records, Some(timepoint)))?;
        let leaves = tree.leaf_count(ROOT_NAME);
        distance.insert(timepoint, leaves.abs_diff(target));
        visits.push(timepoint);
        debug!("     timepoint:{}, cellstage:{}", timepoint, leaves);

        if leaves < target {
            if timepoint >= STAGE_SEARCH_CEILING {
                break;
            }
            timepoint += 1;
        } else if leaves > target {
            if timepoint <= 1 {
                break;
            }
            timepoint -= 1;
        } else {
            break;
        }
    }

    let best = visits
        .iter()
        .copied()
        .min_by_key(|tp| distance[tp])
        .unwrap_or(STAGE_SEARCH_CEILING);
    info!(
        "Cell stage {} -> timepoint {} (off by {})",
        target, best, distance[&best]
    );
    Ok(best)
}
