//! Lineage tree stored as an arena keyed by cell name.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};

use crate::error::{LineageError, Result};
use crate::records::CellSeries;
use crate::topology::{self, Branch, ROOT_NAME, SKELETON, SKELETON_SERIES_LEN};

/// One cell, or a placeholder ancestor when `start_timepoint` is 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: String,
    pub series: Vec<f64>,
    pub start_timepoint: u32,
    pub left: Option<String>,
    pub right: Option<String>,
    pub pos_x: f64,
    pub pos_y: f64,
}

impl Node {
    fn placeholder(name: &str, series_len: usize) -> Self {
        Node {
            name: name.to_string(),
            series: vec![0.0; series_len],
            ..Node::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Both child slots filled.
    pub fn children(&self) -> Option<(&str, &str)> {
        match (&self.left, &self.right) {
            (Some(l), Some(r)) => Some((l.as_str(), r.as_str())),
            _ => None,
        }
    }

    fn child_names(&self) -> impl Iterator<Item = &str> {
        self.left.iter().chain(self.right.iter()).map(String::as_str)
    }
}

/// Cells addressed by name. Parents are never stored; they follow from the name.
#[derive(Debug, Clone)]
pub struct LineageTree {
    nodes: FxHashMap<String, Node>,
}

impl LineageTree {
    /// Build the tree from grouped records, on top of the skeleton ancestors.
    ///
    /// A cell present in `cells` replaces any skeleton node of the same name, children
    /// included; it only gets the children that are themselves in `cells`.
    pub fn build(cells: &BTreeMap<String, CellSeries>) -> Result<Self> {
        let mut tree = LineageTree::skeleton()?;

        for (name, cell) in cells {
            tree.nodes.insert(
                name.clone(),
                Node {
                    name: name.clone(),
                    series: cell.series.clone(),
                    start_timepoint: cell.start_timepoint,
                    ..Node::default()
                },
            );
        }

        for name in cells.keys() {
            tree.link(name)?;
        }
        tree.prune_unreachable();

        debug!(
            "Built lineage tree: {} nodes, {} leaves",
            tree.nodes.len(),
            tree.leaf_count(ROOT_NAME)
        );
        Ok(tree)
    }

    fn skeleton() -> Result<Self> {
        let mut tree = LineageTree {
            nodes: FxHashMap::default(),
        };
        for name in SKELETON {
            tree.nodes
                .insert(name.to_string(), Node::placeholder(name, SKELETON_SERIES_LEN));
        }
        for name in SKELETON {
            tree.link(name)?;
        }
        Ok(tree)
    }

    /// Attach `name` under its parent, and every ancestor under its own parent up to
    /// the root, creating placeholder ancestors as needed.
    fn link(&mut self, name: &str) -> Result<()> {
        let mut child = name.to_string();
        while let Some((parent, branch)) = topology::resolve_parent(&child)? {
            let node = self.nodes.entry(parent.clone()).or_insert_with(|| {
                debug!("Created placeholder ancestor {}", parent);
                Node::placeholder(&parent, 0)
            });
            match branch {
                Branch::Left => node.left = Some(child),
                Branch::Right => node.right = Some(child),
            }
            child = parent;
        }
        Ok(())
    }

    /// Drop skeleton nodes cut off when a data cell replaced their parent.
    fn prune_unreachable(&mut self) {
        let Ok(order) = self.level_order(ROOT_NAME) else {
            return;
        };
        let reachable: FxHashSet<String> = order.into_iter().collect();
        self.nodes.retain(|name, _| reachable.contains(name));
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn require(&self, root: &str) -> Result<&Node> {
        self.nodes.get(root).ok_or_else(|| LineageError::UnknownRoot {
            root: root.to_string(),
        })
    }

    /// Breadth-first names starting at `root`, left child before right.
    pub fn level_order(&self, root: &str) -> Result<Vec<String>> {
        self.require(root)?;
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([root.to_string()]);
        while let Some(name) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&name) {
                queue.extend(node.child_names().map(str::to_string));
            }
            order.push(name);
        }
        Ok(order)
    }

    /// Children-before-parent names starting at `root`, left subtree first.
    pub fn post_order(&self, root: &str) -> Result<Vec<String>> {
        self.require(root)?;
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(root.to_string(), false)];
        while let Some((name, expanded)) = stack.pop() {
            if expanded {
                order.push(name);
                continue;
            }
            let children: Vec<String> = self
                .nodes
                .get(&name)
                .map(|n| n.child_names().map(str::to_string).collect())
                .unwrap_or_default();
            stack.push((name, true));
            for child in children.into_iter().rev() {
                stack.push((child, false));
            }
        }
        Ok(order)
    }

    /// Leaves reachable from `root`; 0 when `root` is unknown.
    pub fn leaf_count(&self, root: &str) -> usize {
        self.level_order(root)
            .map(|order| {
                order
                    .iter()
                    .filter(|name| self.nodes.get(*name).map_or(true, Node::is_leaf))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(entries: &[(&str, u32, &[f64])]) -> BTreeMap<String, CellSeries> {
        entries
            .iter()
            .map(|(name, start, series)| {
                (
                    name.to_string(),
                    CellSeries {
                        start_timepoint: *start,
                        series: series.to_vec(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_skeleton() {
        let tree = LineageTree::build(&BTreeMap::new()).unwrap();
        assert_eq!(tree.len(), SKELETON.len());
        assert_eq!(tree.leaf_count(ROOT_NAME), 4);
        let p0 = tree.get("P0").unwrap();
        assert_eq!(p0.children(), Some(("AB", "P1")));
        assert_eq!(p0.series, vec![0.0; SKELETON_SERIES_LEN]);
        assert_eq!(p0.start_timepoint, 0);
    }

    #[test]
    fn data_is_attached_by_name() {
        let tree = LineageTree::build(&cells(&[
            ("ABal", 20, &[1.0, 2.0]),
            ("ABar", 20, &[3.0]),
            ("MS", 22, &[4.0]),
            ("E", 22, &[5.0]),
        ]))
        .unwrap();

        assert_eq!(tree.get("ABa").unwrap().children(), Some(("ABal", "ABar")));
        assert_eq!(tree.get("EMS").unwrap().children(), Some(("MS", "E")));
        assert_eq!(tree.get("ABal").unwrap().series, vec![1.0, 2.0]);
        assert_eq!(tree.leaf_count(ROOT_NAME), 6);
    }

    #[test]
    fn data_cell_replaces_skeleton_node_and_its_children() {
        let tree = LineageTree::build(&cells(&[("AB", 3, &[7.0, 8.0])])).unwrap();
        let ab = tree.get("AB").unwrap();
        assert!(ab.is_leaf());
        assert_eq!(ab.start_timepoint, 3);
        assert_eq!(ab.series, vec![7.0, 8.0]);
        assert!(!tree.contains("ABa"));
        assert!(!tree.contains("ABp"));
        // AB plus the untouched skeleton leaves EMS and P2
        assert_eq!(tree.leaf_count(ROOT_NAME), 3);
    }

    #[test]
    fn early_stages_count_only_observed_cells() {
        let one = LineageTree::build(&cells(&[("P0", 1, &[1.0, 1.0, 1.0])])).unwrap();
        assert_eq!(one.leaf_count(ROOT_NAME), 1);
        assert_eq!(one.len(), 1);

        let two = LineageTree::build(&cells(&[
            ("P0", 1, &[1.0, 1.0, 1.0]),
            ("AB", 4, &[2.0, 2.0, 2.0]),
            ("P1", 4, &[3.0, 3.0, 3.0]),
        ]))
        .unwrap();
        assert_eq!(two.leaf_count(ROOT_NAME), 2);
        assert_eq!(two.get("P0").unwrap().children(), Some(("AB", "P1")));
        assert_eq!(two.level_order(ROOT_NAME).unwrap().len(), two.len());
    }

    #[test]
    fn replaced_skeleton_node_regains_children_from_data() {
        let tree = LineageTree::build(&cells(&[
            ("AB", 3, &[1.0]),
            ("ABa", 4, &[1.0]),
            ("ABp", 4, &[1.0]),
        ]))
        .unwrap();
        assert_eq!(tree.get("AB").unwrap().children(), Some(("ABa", "ABp")));
        assert_eq!(tree.leaf_count(ROOT_NAME), 4);
    }

    #[test]
    fn missing_ancestors_become_placeholders() {
        let tree = LineageTree::build(&cells(&[("ABpla", 40, &[1.0])])).unwrap();
        assert!(tree.contains("ABpl"));
        let abp = tree.get("ABp").unwrap();
        assert_eq!(abp.left.as_deref(), Some("ABpl"));
        assert!(abp.right.is_none());
        assert!(tree.get("ABpl").unwrap().series.is_empty());
    }

    #[test]
    fn every_node_is_reachable_from_root() {
        let tree = LineageTree::build(&cells(&[
            ("ABalpa", 50, &[1.0]),
            ("Caa", 40, &[1.0]),
            ("Z2", 60, &[2.0]),
            ("MSp", 30, &[1.0]),
        ]))
        .unwrap();
        let reachable = tree.level_order(ROOT_NAME).unwrap();
        assert_eq!(reachable.len(), tree.len());
    }

    #[test]
    fn unresolvable_name_aborts_build() {
        let err = LineageTree::build(&cells(&[("ABx", 1, &[1.0])])).unwrap_err();
        assert!(matches!(err, LineageError::LineageResolution { ref name } if name == "ABx"));
    }

    #[test]
    fn traversal_orders() {
        let tree = LineageTree::build(&BTreeMap::new()).unwrap();
        assert_eq!(
            tree.level_order("P0").unwrap(),
            vec!["P0", "AB", "P1", "ABa", "ABp", "EMS", "P2"]
        );
        assert_eq!(
            tree.post_order("P0").unwrap(),
            vec!["ABa", "ABp", "AB", "EMS", "P2", "P1", "P0"]
        );
        assert!(matches!(
            tree.level_order("Nope"),
            Err(LineageError::UnknownRoot { .. })
        ));
    }
}
