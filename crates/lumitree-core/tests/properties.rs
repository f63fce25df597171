use std::collections::HashSet;

use lumitree_core::{
    MoveError, NodeId, ProjectionConfig, Tree, TreeRecord, apply_patches, build_tree,
    descendant_ids, diff, find_node, find_path, flatten, move_node, project,
};
use proptest::prelude::*;
use proptest::sample::Index;

#[derive(Debug, Clone)]
struct Record {
    id: NodeId,
    parent_id: Option<NodeId>,
    order: i64,
    folder: bool,
}

impl TreeRecord for Record {
    fn id(&self) -> NodeId {
        self.id
    }
    fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }
    fn order(&self) -> i64 {
        self.order
    }
    fn is_container(&self) -> bool {
        self.folder
    }
    fn set_parent_id(&mut self, parent_id: Option<NodeId>) {
        self.parent_id = parent_id;
    }
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// Records whose parents always point at an earlier record (or nowhere).
fn records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((any::<Option<Index>>(), any::<bool>(), 0i64..5), 1..24).prop_map(
        |rows| {
            rows
                .into_iter()
                .enumerate()
                .map(|(i, (parent, folder, order))| Record {
                    id: i as NodeId + 1,
                    parent_id: parent.filter(|_| i > 0).map(|ix| ix.index(i) as NodeId + 1),
                    order,
                    folder,
                })
                .collect()
        },
    )
}

type MoveStep = (Index, Index, bool, usize);

fn moves() -> impl Strategy<Value = Vec<MoveStep>> {
    prop::collection::vec((any::<Index>(), any::<Index>(), any::<bool>(), 0usize..4), 0..10)
}

/// Destination next to, or inside, the node picked by `target`.
fn destination(tree: &Tree, target: NodeId, nest: bool, k: usize) -> Vec<usize> {
    let mut path = find_path(tree, target).unwrap_or_else(|| vec![0]);
    let is_container = find_node(tree, target).is_some_and(|n| n.is_container());
    if nest && is_container {
        path.push(k);
    } else if let Some(last) = path.last_mut() {
        *last += k % 2;
    }
    path
}

fn apply_moves(tree: &Tree, steps: &[MoveStep]) -> Tree {
    let mut current = tree.clone();
    for &(pick, target, nest, k) in steps {
        let ids = current.ids();
        let id = ids[pick.index(ids.len())];
        let dest = destination(&current, ids[target.index(ids.len())], nest, k);
        match move_node(&current, id, &dest) {
            Ok(next) => current = next,
            Err(MoveError::Cycle { .. } | MoveError::InvalidDestination(_)) => {}
            Err(err) => panic!("unexpected move error: {err}"),
        }
    }
    current
}

proptest! {
    #[test]
    fn prop_round_trip(records in records(), steps in moves()) {
        let old = build_tree(&records);
        let new = apply_moves(&old, &steps);

        prop_assert_eq!(new.len(), old.len());
        let patches = diff(&old, &new);
        prop_assert_eq!(apply_patches(&old, &patches), new);
    }

    #[test]
    fn prop_diff_of_self_is_empty(records in records(), steps in moves()) {
        let tree = apply_moves(&build_tree(&records), &steps);
        prop_assert!(diff(&tree, &tree).is_empty());
    }

    #[test]
    fn prop_every_record_is_placed_once(records in records()) {
        let tree = build_tree(&records);
        let mut ids = tree.ids();
        ids.sort_unstable();
        let expected: Vec<NodeId> = records.iter().map(|r| r.id).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_cycles_rejected(records in records()) {
        let tree = build_tree(&records);
        for id in tree.ids() {
            if !find_node(&tree, id).is_some_and(|n| n.is_container()) {
                continue;
            }
            let own = find_path(&tree, id).unwrap();
            let is_cycle = matches!(move_node(&tree, id, &own), Err(MoveError::Cycle { .. }));
            prop_assert!(is_cycle);
            for descendant in descendant_ids(&tree, id) {
                let path = find_path(&tree, descendant).unwrap();
                let is_cycle = matches!(move_node(&tree, id, &path), Err(MoveError::Cycle { .. }));
                prop_assert!(is_cycle);
            }
        }
    }

    #[test]
    fn prop_projection_depth_within_bounds(
        records in records(),
        dragged in any::<Index>(),
        over in any::<Index>(),
        offset in any::<f64>(),
    ) {
        let tree = build_tree(&records);
        let expanded: HashSet<NodeId> = records.iter().filter(|r| r.folder).map(|r| r.id).collect();
        let items = flatten(&tree, &expanded);
        let dragged_id = items[dragged.index(items.len())].id;
        let over_id = items[over.index(items.len())].id;

        let p = project(&items, dragged_id, over_id, offset, &ProjectionConfig::default());
        prop_assert!(p.min_depth <= p.depth);
        prop_assert!(p.depth <= p.max_depth);
    }
}
