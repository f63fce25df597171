//! Minimal change sets between two tree snapshots.
//!
//! A [`Patch`] is keyed by node id and names only the attributes that
//! changed. Paths are never used here since they do not survive a diff.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::trace;

use crate::record::{NodeId, TreeRecord};
use crate::tree::{Slot, Tree, assemble, visit};

// ── Patch ────────────────────────────────────────────────────────────

/// A sparse update of one node's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    pub id: NodeId,
    /// `Some(new_parent)` when the parent changed; `Some(None)` moves to root.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub parent_id: Option<Option<NodeId>>,
    /// New sibling index when the node moved at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.parent_id.is_none() && self.order.is_none()
    }
}

/// A field that is present in the input, even as `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<NodeId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NodeId>::deserialize(deserializer).map(Some)
}

// ── Diff ─────────────────────────────────────────────────────────────

/// Patches that turn `old` into `new`, in `new`'s pre-order.
///
/// Only ids present in both trees are considered: creation and deletion are
/// not expressed as patches. A patch always carries `order`, and carries
/// `parent_id` only when the parent changed.
pub fn diff(old: &Tree, new: &Tree) -> Vec<Patch> {
    let mut before: HashMap<NodeId, (Option<NodeId>, usize)> = HashMap::with_capacity(old.len());
    visit(old.roots(), None, 0, &mut |node, parent_id, index, _| {
        before.insert(node.id(), (parent_id, index));
    });

    let mut patches = Vec::new();
    visit(new.roots(), None, 0, &mut |node, parent_id, index, _| {
        let Some(&(old_parent, old_index)) = before.get(&node.id()) else {
            return;
        };
        let parent_changed = old_parent != parent_id;
        if parent_changed || old_index != index {
            patches.push(Patch {
                id: node.id(),
                parent_id: parent_changed.then_some(parent_id),
                order: Some(index as i64),
            });
        }
    });

    trace!(patches = patches.len(), "diffed tree snapshots");
    patches
}

/// Patches that bring stored records in line with `new`, in `new`'s pre-order.
///
/// Unlike [`diff`], this compares against the records' stored `parent_id`
/// and `order`, so sparse sort keys and normalized orphans are rewritten to
/// the positions `new` gives them. After `apply_to_records`, `build_tree`
/// on the records yields `new`.
pub fn diff_records<R: TreeRecord>(records: &[R], new: &Tree) -> Vec<Patch> {
    let mut stored: HashMap<NodeId, (Option<NodeId>, i64)> = HashMap::with_capacity(records.len());
    for record in records {
        stored
            .entry(record.id())
            .or_insert((record.parent_id(), record.order()));
    }

    let mut patches = Vec::new();
    visit(new.roots(), None, 0, &mut |node, parent_id, index, _| {
        let Some(&(old_parent, old_order)) = stored.get(&node.id()) else {
            return;
        };
        let parent_changed = old_parent != parent_id;
        if parent_changed || old_order != index as i64 {
            patches.push(Patch {
                id: node.id(),
                parent_id: parent_changed.then_some(parent_id),
                order: Some(index as i64),
            });
        }
    });

    trace!(patches = patches.len(), "diffed records against tree");
    patches
}

// ── Apply ────────────────────────────────────────────────────────────

/// Rebuild a tree from `tree` with `patches` overlaid.
///
/// Unpatched nodes keep their sibling index as sort key, so
/// `apply_patches(old, &diff(old, new)) == new` for any `new` reachable by moves.
/// Patches for unknown ids are ignored.
pub fn apply_patches(tree: &Tree, patches: &[Patch]) -> Tree {
    let mut slots: Vec<Slot> = Vec::with_capacity(tree.len());
    visit(tree.roots(), None, 0, &mut |node, parent_id, index, _| {
        slots.push(Slot {
            id: node.id(),
            parent_id,
            order: index as i64,
            is_container: node.is_container(),
        });
    });

    let index_of: HashMap<NodeId, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.id, i))
        .collect();

    for patch in patches {
        let Some(&i) = index_of.get(&patch.id) else {
            trace!(id = patch.id, "patch for unknown node ignored");
            continue;
        };
        if let Some(parent_id) = patch.parent_id {
            slots[i].parent_id = parent_id;
        }
        if let Some(order) = patch.order {
            slots[i].order = order;
        }
    }

    trace!(nodes = slots.len(), patches = patches.len(), "applied patches");
    assemble(&slots)
}

/// Write `patches` onto record values. Records are matched by id; patches
/// for unknown ids are ignored.
pub fn apply_to_records<R: TreeRecord>(records: &mut [R], patches: &[Patch]) {
    let mut index_of: HashMap<NodeId, usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        index_of.entry(record.id()).or_insert(i);
    }

    for patch in patches {
        let Some(&i) = index_of.get(&patch.id) else {
            continue;
        };
        if let Some(parent_id) = patch.parent_id {
            records[i].set_parent_id(parent_id);
        }
        if let Some(order) = patch.order {
            records[i].set_order(order);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::move_node;
    use crate::record::testing::{folder, leaf};
    use crate::tree::{TreeNode, build_tree};

    fn abc() -> Tree {
        build_tree(&[leaf(1, None, 0), leaf(2, None, 1), leaf(3, None, 2)])
    }

    /// Folder 10 { 11, 12 }, folder 20 { 21 }, 30
    fn folders() -> Tree {
        build_tree(&[
            folder(10, None, 0),
            leaf(11, Some(10), 0),
            leaf(12, Some(10), 1),
            folder(20, None, 1),
            leaf(21, Some(20), 0),
            leaf(30, None, 2),
        ])
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let tree = folders();
        assert!(diff(&tree, &tree).is_empty());
        assert!(diff(&Tree::default(), &Tree::default()).is_empty());
    }

    #[test]
    fn test_diff_minimal_reorder() {
        let old = abc();
        let new = move_node(&old, 3, &[1]).unwrap();
        assert_eq!(new.ids(), vec![1, 3, 2]);

        let patches = diff(&old, &new);
        assert_eq!(
            patches,
            vec![
                Patch {
                    id: 3,
                    parent_id: None,
                    order: Some(1)
                },
                Patch {
                    id: 2,
                    parent_id: None,
                    order: Some(2)
                },
            ]
        );
    }

    #[test]
    fn test_diff_reparent_always_carries_order() {
        let old = folders();
        // 21 moves from index 0 in folder 20 to index 0 in folder 10.
        let new = move_node(&old, 21, &[0, 0]).unwrap();
        let patches = diff(&old, &new);

        let moved = patches.iter().find(|p| p.id == 21).unwrap();
        assert_eq!(moved.parent_id, Some(Some(10)));
        assert_eq!(moved.order, Some(0));
        // 11 and 12 shift down one slot inside folder 10.
        assert!(patches.iter().any(|p| p.id == 11 && p.order == Some(1)));
        assert!(patches.iter().any(|p| p.id == 12 && p.order == Some(2)));
        assert!(!patches.iter().any(|p| p.id == 10 || p.id == 20 || p.id == 30));
    }

    #[test]
    fn test_diff_move_to_root_patches_null_parent() {
        let old = folders();
        let new = move_node(&old, 12, &[3]).unwrap();
        let patches = diff(&old, &new);
        assert_eq!(
            patches,
            vec![Patch {
                id: 12,
                parent_id: Some(None),
                order: Some(3)
            }]
        );
    }

    #[test]
    fn test_diff_ignores_created_and_deleted() {
        let old = build_tree(&[leaf(1, None, 0), leaf(2, None, 1)]);
        let new = build_tree(&[leaf(3, None, 0), leaf(1, None, 1)]);
        let patches = diff(&old, &new);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].id, 1);
    }

    #[test]
    fn test_round_trip_after_moves() {
        let old = folders();
        let step1 = move_node(&old, 30, &[0, 1]).unwrap();
        let step2 = move_node(&step1, 10, &[1, 1]).unwrap();
        let new = move_node(&step2, 12, &[0]).unwrap();

        let patches = diff(&old, &new);
        assert_eq!(apply_patches(&old, &patches), new);
    }

    #[test]
    fn test_apply_ignores_unknown_ids() {
        let tree = abc();
        let patches = vec![Patch {
            id: 99,
            parent_id: Some(Some(1)),
            order: Some(0),
        }];
        assert_eq!(apply_patches(&tree, &patches), tree);
    }

    #[test]
    fn test_apply_under_leaf_promotes_to_root() {
        let tree = abc();
        let patches = vec![Patch {
            id: 3,
            parent_id: Some(Some(1)),
            order: Some(0),
        }];
        let applied = apply_patches(&tree, &patches);
        assert_eq!(applied.len(), 3);
        assert!(applied.roots().iter().all(|n| !n.is_container()));
    }

    #[test]
    fn test_apply_to_records_matches_tree() {
        let mut records = vec![
            folder(10, None, 0),
            leaf(11, Some(10), 0),
            leaf(12, Some(10), 1),
            folder(20, None, 1),
            leaf(21, Some(20), 0),
            leaf(30, None, 2),
        ];
        let old = build_tree(&records);
        let new = move_node(&old, 11, &[1, 1]).unwrap();
        let patches = diff(&old, &new);

        apply_to_records(&mut records, &patches);
        assert_eq!(build_tree(&records), new);
        assert_eq!(records[1].parent_id, Some(20));
        assert_eq!(records[1].order, 1);
        assert_eq!(
            new.roots()[1],
            TreeNode::container(20, vec![TreeNode::leaf(21), TreeNode::leaf(11)])
        );
    }

    #[test]
    fn test_diff_records_rewrites_sparse_orders() {
        let mut records = vec![
            leaf(1, None, 0),
            leaf(2, None, 5),
            leaf(3, None, 6),
            leaf(4, None, 7),
        ];
        let old = build_tree(&records);
        let new = move_node(&old, 4, &[2]).unwrap();
        assert_eq!(new.ids(), vec![1, 2, 4, 3]);

        // A plain tree diff leaves 2 at its stale key of 5.
        let tree_patches = diff(&old, &new);
        assert!(!tree_patches.iter().any(|p| p.id == 2));

        let patches = diff_records(&records, &new);
        assert!(patches.iter().any(|p| p.id == 2 && p.order == Some(1)));
        assert!(!patches.iter().any(|p| p.id == 1));
        apply_to_records(&mut records, &patches);
        assert_eq!(build_tree(&records), new);
    }

    #[test]
    fn test_diff_records_rewrites_orphan_parent() {
        let records = vec![leaf(1, None, 0), leaf(2, Some(99), 1)];
        let tree = build_tree(&records);
        let patches = diff_records(&records, &tree);
        assert_eq!(
            patches,
            vec![Patch {
                id: 2,
                parent_id: Some(None),
                order: Some(1)
            }]
        );
    }

    #[test]
    fn test_diff_records_canonical_matches_diff() {
        let records = vec![
            folder(10, None, 0),
            leaf(11, Some(10), 0),
            leaf(12, Some(10), 1),
            folder(20, None, 1),
            leaf(21, Some(20), 0),
            leaf(30, None, 2),
        ];
        let old = build_tree(&records);
        let new = move_node(&old, 10, &[1, 0]).unwrap();
        assert_eq!(diff_records(&records, &new), diff(&old, &new));
    }

    #[test]
    fn test_patch_serde_omits_absent_fields() {
        let reorder = Patch {
            id: 3,
            parent_id: None,
            order: Some(1),
        };
        assert_eq!(
            serde_json::to_string(&reorder).unwrap(),
            r#"{"id":3,"order":1}"#
        );

        let to_root = Patch {
            id: 4,
            parent_id: Some(None),
            order: Some(0),
        };
        let json = serde_json::to_string(&to_root).unwrap();
        assert_eq!(json, r#"{"id":4,"parent_id":null,"order":0}"#);
        assert_eq!(serde_json::from_str::<Patch>(&json).unwrap(), to_root);
        assert_eq!(
            serde_json::from_str::<Patch>(r#"{"id":3,"order":1}"#).unwrap(),
            reorder
        );
    }
}
