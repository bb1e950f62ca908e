//! Node positions and canvas extents.
//!
//! Horizontal positions need the children first (post-order), vertical positions need the
//! parent first (level-order), so they run as two separate passes.

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{LineageError, Result};
use crate::topology::{self, ROOT_NAME};
use crate::tree::LineageTree;

/// Fixed geometry of the diagram, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub left_margin: f64,
    pub right_margin: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    /// Room reserved left of the tree for the timepoint axis.
    pub axis_width: f64,
    /// Room reserved right of the tree for the color legend.
    pub brand_width: f64,
    /// Stroke width of a cell segment.
    pub line_width: f64,
    /// Gap between neighbouring leaves.
    pub line_spacing: f64,
    /// Vertical pixels per timepoint.
    pub scale: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            left_margin: 100.0,
            right_margin: 100.0,
            top_margin: 100.0,
            bottom_margin: 100.0,
            axis_width: 80.0,
            brand_width: 80.0,
            line_width: 5.0,
            line_spacing: 15.0,
            scale: 5.0,
        }
    }
}

impl LayoutConfig {
    fn leaf_step(&self) -> f64 {
        self.line_width + self.line_spacing
    }
}

/// Result of laying out one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Leaves under the layout root.
    pub leaf_count: usize,
    /// Last observed timepoint of the whole lineage.
    pub end_timepoint: u32,
}

/// Position every node under `root` and size the canvas.
pub fn layout(tree: &mut LineageTree, root: &str, config: &LayoutConfig) -> Result<Canvas> {
    let leaf_count = assign_horizontal_positions(tree, root, config)?;
    assign_vertical_positions(tree, root, config)?;

    let width = config.left_margin + config.right_margin + leaf_count as f64 * config.leaf_step()
        - config.line_spacing
        + config.axis_width
        + config.brand_width;
    let height = config.top_margin
        + config.bottom_margin
        + config.scale * max_cumulative_depth(tree, root)? as f64;

    let canvas = Canvas {
        width,
        height,
        leaf_count,
        end_timepoint: end_timepoint(tree),
    };
    debug!("Canvas {}x{} for {} leaves", canvas.width, canvas.height, leaf_count);
    Ok(canvas)
}

/// Post-order pass: leaves take consecutive slots, parents sit midway between
/// their children. Returns the number of leaves.
pub fn assign_horizontal_positions(
    tree: &mut LineageTree,
    root: &str,
    config: &LayoutConfig,
) -> Result<usize> {
    let mut next_leaf_x = config.left_margin + config.axis_width;
    let mut leaves = 0;

    for name in tree.post_order(root)? {
        let Some(node) = tree.get(&name) else {
            continue;
        };
        let x = match (&node.left, &node.right) {
            (Some(left), Some(right)) => {
                let lx = tree.get(left).map_or(0.0, |n| n.pos_x);
                let rx = tree.get(right).map_or(0.0, |n| n.pos_x);
                lx + 0.5 * (rx - lx)
            }
            (None, None) => {
                let x = next_leaf_x;
                next_leaf_x += config.leaf_step();
                leaves += 1;
                x
            }
            _ => return Err(LineageError::LayoutValidation { node: name }),
        };
        if let Some(node) = tree.get_mut(&name) {
            node.pos_x = x;
        }
    }

    Ok(leaves)
}

/// Level-order pass: children start where the parent's own segment ends.
pub fn assign_vertical_positions(
    tree: &mut LineageTree,
    root: &str,
    config: &LayoutConfig,
) -> Result<()> {
    if let Some(node) = tree.get_mut(root) {
        node.pos_y = config.top_margin;
    }

    for name in tree.level_order(root)? {
        let Some(node) = tree.get(&name) else {
            continue;
        };
        let end_y = node.pos_y + config.scale * node.series.len() as f64;
        let children: Vec<String> = node.left.iter().chain(node.right.iter()).cloned().collect();
        for child in children {
            if let Some(child) = tree.get_mut(&child) {
                child.pos_y = end_y;
            }
        }
    }

    Ok(())
}

/// Largest sum of series lengths along any path from `root`.
pub fn max_cumulative_depth(tree: &LineageTree, root: &str) -> Result<usize> {
    let mut depth: FxHashMap<String, usize> = FxHashMap::default();
    let mut max = 0;
    for name in tree.level_order(root)? {
        let own = tree.get(&name).map_or(0, |n| n.series.len());
        let inherited = if name == root {
            0
        } else {
            topology::resolve_parent(&name)?
                .and_then(|(parent, _)| depth.get(&parent).copied())
                .unwrap_or(0)
        };
        let total = own + inherited;
        max = max.max(total);
        depth.insert(name, total);
    }
    Ok(max)
}

/// Last observed timepoint over all non-placeholder cells of the lineage.
pub fn end_timepoint(tree: &LineageTree) -> u32 {
    let Ok(order) = tree.level_order(ROOT_NAME) else {
        return 0;
    };
    order
        .iter()
        .filter_map(|name| tree.get(name))
        .filter(|node| node.start_timepoint > 0)
        .map(|node| (node.start_timepoint as usize + node.series.len()).saturating_sub(1) as u32)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CellSeries;
    use std::collections::BTreeMap;

    fn tree(entries: &[(&str, u32, usize)]) -> LineageTree {
        let cells: BTreeMap<String, CellSeries> = entries
            .iter()
            .map(|(name, start, len)| {
                (
                    name.to_string(),
                    CellSeries {
                        start_timepoint: *start,
                        series: vec![1.0; *len],
                    },
                )
            })
            .collect();
        LineageTree::build(&cells).unwrap()
    }

    #[test]
    fn two_leaf_canvas_width() {
        let mut t = tree(&[]);
        let canvas = layout(&mut t, "AB", &LayoutConfig::default()).unwrap();
        assert_eq!(canvas.leaf_count, 2);
        assert_eq!(canvas.width, 100.0 + 100.0 + 2.0 * 20.0 - 15.0 + 80.0 + 80.0);
        // AB and one child, five samples each
        assert_eq!(canvas.height, 100.0 + 100.0 + 5.0 * 10.0);
    }

    #[test]
    fn leaves_are_spaced_and_parents_centered() {
        let mut t = tree(&[]);
        let config = LayoutConfig::default();
        layout(&mut t, "P0", &config).unwrap();

        let x = |n: &str| t.get(n).unwrap().pos_x;
        assert_eq!(x("ABa"), 180.0);
        assert_eq!(x("ABp"), 200.0);
        assert_eq!(x("EMS"), 220.0);
        assert_eq!(x("P2"), 240.0);
        assert_eq!(x("AB"), 190.0);
        assert_eq!(x("P1"), 230.0);
        assert_eq!(x("P0"), 210.0);
    }

    #[test]
    fn children_start_where_parent_ends() {
        let mut t = tree(&[
            ("AB", 1, 3),
            ("ABa", 4, 2),
            ("ABp", 4, 2),
            ("ABal", 6, 1),
            ("ABar", 6, 8),
        ]);
        let config = LayoutConfig::default();
        let canvas = layout(&mut t, "P0", &config).unwrap();

        let y = |n: &str| t.get(n).unwrap().pos_y;
        assert_eq!(y("P0"), 100.0);
        assert_eq!(y("AB"), 125.0);
        assert_eq!(y("P1"), 125.0);
        assert_eq!(y("ABa"), 140.0);
        assert_eq!(y("ABal"), 150.0);
        // deepest path P0 -> AB -> ABa -> ABar: 5 + 3 + 2 + 8
        assert_eq!(canvas.height, 200.0 + 5.0 * 18.0);
    }

    #[test]
    fn replaced_skeleton_node_without_data_children_is_a_leaf() {
        let mut t = tree(&[("P0", 1, 3), ("AB", 4, 3), ("P1", 4, 3)]);
        let canvas = layout(&mut t, "P0", &LayoutConfig::default()).unwrap();
        assert_eq!(canvas.leaf_count, 2);
        assert_eq!(canvas.end_timepoint, 6);
        assert_eq!(canvas.height, 200.0 + 5.0 * 6.0);
    }

    #[test]
    fn single_child_is_rejected() {
        let mut t = tree(&[("ABpla", 10, 1)]);
        match layout(&mut t, "P0", &LayoutConfig::default()) {
            Err(LineageError::LayoutValidation { node }) => assert_eq!(node, "ABpl"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn end_timepoint_ignores_placeholders() {
        let t = tree(&[("ABal", 10, 5), ("ABar", 8, 3)]);
        assert_eq!(end_timepoint(&t), 14);
        assert_eq!(end_timepoint(&tree(&[])), 0);
    }

    #[test]
    fn unknown_root_is_reported() {
        let mut t = tree(&[]);
        assert!(matches!(
            layout(&mut t, "ABxx", &LayoutConfig::default()),
            Err(LineageError::UnknownRoot { .. })
        ));
    }
}
