use thiserror::Error;
use tracing::debug;

use crate::record::NodeId;
use crate::tree::{Tree, TreeNode, find_path, node_at_path, siblings_mut};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Invalid destination path: {0:?}")]
    InvalidDestination(Vec<usize>),

    #[error("Cannot move container {id} into itself or a descendant (destination {destination:?})")]
    Cycle { id: NodeId, destination: Vec<usize> },
}

/// Move the node `id`, with its subtree, to `destination`.
///
/// `destination` names a slot in `tree` as it is before the move. A
/// destination at the source's own level keeps its index, so moving a node
/// forward lands it right after the sibling that used to occupy the slot.
/// A destination that descends through a later sibling of the source is
/// shifted down by one to follow the removal. The final insertion index is
/// clamped to the sibling count.
///
/// Returns a new tree. The input tree is never modified, and a rejected move
/// leaves nothing to roll back.
pub fn move_node(tree: &Tree, id: NodeId, destination: &[usize]) -> Result<Tree, MoveError> {
    let source = find_path(tree, id).ok_or(MoveError::NotFound(id))?;
    let node = node_at_path(tree, &source).ok_or(MoveError::NotFound(id))?;

    if node.is_container() && destination.starts_with(&source) {
        debug!(id, ?source, ?destination, "rejected move into own subtree");
        return Err(MoveError::Cycle {
            id,
            destination: destination.to_vec(),
        });
    }

    let invalid = || MoveError::InvalidDestination(destination.to_vec());
    let (_, parent_path) = destination.split_last().ok_or_else(invalid)?;
    if !parent_path.is_empty() && !node_at_path(tree, parent_path).is_some_and(TreeNode::is_container) {
        debug!(id, ?destination, "rejected move under a missing or leaf parent");
        return Err(invalid());
    }

    let adjusted = adjust_destination(&source, destination);

    let mut roots = tree.roots().to_vec();
    let (&source_index, source_parent) = source.split_last().ok_or(MoveError::NotFound(id))?;
    let moved = siblings_mut(&mut roots, source_parent)
        .filter(|siblings| source_index < siblings.len())
        .ok_or(MoveError::NotFound(id))?
        .remove(source_index);

    let (&insert_at, insert_parent) = adjusted.split_last().ok_or_else(invalid)?;
    let siblings = siblings_mut(&mut roots, insert_parent).ok_or_else(invalid)?;
    let index = insert_at.min(siblings.len());
    siblings.insert(index, moved);

    debug!(id, ?source, ?adjusted, "moved node");
    Ok(Tree::new(roots))
}

/// Re-target `destination` after the node at `source` has been removed.
fn adjust_destination(source: &[usize], destination: &[usize]) -> Vec<usize> {
    let mut adjusted = destination.to_vec();
    let depth = source.len() - 1;
    let through_later_sibling = destination.len() > source.len()
        && destination[..depth] == source[..depth]
        && source[depth] < destination[depth];
    if through_later_sibling {
        adjusted[depth] -= 1;
    }
    adjusted
}

// ── Tests ────────────────────────────────────────────────────────────
