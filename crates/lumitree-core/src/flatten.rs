use std::collections::HashSet;

use serde::Serialize;

use crate::record::NodeId;
use crate::tree::{Tree, TreeNode};

// ── FlattenedItem ────────────────────────────────────────────────────

/// A flattened entry: one visible row of the tree, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenedItem {
    pub id: NodeId,
    pub depth: usize,
    pub parent_id: Option<NodeId>,
    /// Position among its siblings.
    pub index: usize,
    pub is_container: bool,
    pub has_children: bool,
    /// A container whose children are hidden because it is not expanded.
    pub collapsed: bool,
}

/// Flatten visible tree nodes into a list for rendering and drag projection.
///
/// Pre-order walk that only descends into containers listed in `expanded`.
pub fn flatten(tree: &Tree, expanded: &HashSet<NodeId>) -> Vec<FlattenedItem> {
    let mut out = Vec::new();
    flatten_nodes(tree.roots(), None, 0, expanded, &mut out);
    out
}

fn flatten_nodes(
    nodes: &[TreeNode],
    parent_id: Option<NodeId>,
    depth: usize,
    expanded: &HashSet<NodeId>,
    out: &mut Vec<FlattenedItem>,
) {
    for (index, node) in nodes.iter().enumerate() {
        let id = node.id();
        let is_expanded = expanded.contains(&id);
        out.push(FlattenedItem {
            id,
            depth,
            parent_id,
            index,
            is_container: node.is_container(),
            has_children: !node.children().is_empty(),
            collapsed: node.is_container() && !is_expanded,
        });

        if is_expanded {
            flatten_nodes(node.children(), Some(id), depth + 1, expanded, out);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
