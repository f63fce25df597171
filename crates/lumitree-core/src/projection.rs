//! Drag projection: maps the pointer's horizontal offset during a drag onto
//! the nesting depth the tree topology allows at the drop point.

use serde::Serialize;

use crate::flatten::FlattenedItem;
use crate::record::NodeId;
use crate::tree::{Tree, find_path};

/// Horizontal indentation, in pointer units, of one tree level.
pub const DEFAULT_INDENT_WIDTH: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionConfig {
    pub indent_width: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

/// Outcome of a drag projection. `depth` is always within `min_depth..=max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub depth: usize,
    pub min_depth: usize,
    pub max_depth: usize,
    /// Container the dragged node would land in (`None` for root level).
    pub parent_id: Option<NodeId>,
}

/// Project a drag of `dragged_id` over `over_id` with the given pointer offset.
///
/// The intended depth is the hovered row's depth plus the offset in whole
/// indents. It may go one level below the row preceding the drop point when
/// that row is a container, otherwise no deeper than that row, and never
/// shallower than the hovered row.
pub fn project(
    items: &[FlattenedItem],
    dragged_id: NodeId,
    over_id: NodeId,
    offset_x: f64,
    config: &ProjectionConfig,
) -> Projection {
    let Some((order, over_index)) = reorder(items, dragged_id, over_id) else {
        let hovered = items.iter().find(|item| item.id == over_id);
        let depth = hovered.map_or(0, |item| item.depth);
        return Projection {
            depth,
            min_depth: depth,
            max_depth: depth,
            parent_id: hovered.and_then(|item| item.parent_id),
        };
    };

    let previous = over_index.checked_sub(1).map(|i| order[i]);

    let max_depth = previous.map_or(0, |prev| {
        if prev.is_container {
            prev.depth + 1
        } else {
            prev.depth
        }
    });
    // The dragged row now occupies `over_index`, so read the hovered row's
    // depth from the original list.
    let over_depth = items
        .iter()
        .find(|item| item.id == over_id)
        .map_or(0, |item| item.depth);
    let min_depth = over_depth.min(max_depth);

    let steps = indent_steps(offset_x, config.indent_width);
    let intended = (over_depth as i64).saturating_add(steps);
    let depth = intended.clamp(min_depth as i64, max_depth as i64) as usize;

    let parent_id = match previous {
        None => None,
        Some(_) if depth == 0 => None,
        Some(prev) if depth == prev.depth => prev.parent_id,
        Some(prev) if depth > prev.depth => Some(prev.id),
        Some(_) => order[..over_index]
            .iter()
            .rev()
            .find(|item| item.depth == depth)
            .and_then(|item| item.parent_id),
    };

    Projection {
        depth,
        min_depth,
        max_depth,
        parent_id,
    }
}

/// Destination path for [`crate::move_node`] that realizes `projection`.
///
/// `items` must be the list the projection was computed from and `tree` the
/// snapshot it was flattened from. Returns `None` if the ids are not visible
/// or the projected parent is not in `tree`.
pub fn projected_destination(
    tree: &Tree,
    items: &[FlattenedItem],
    dragged_id: NodeId,
    over_id: NodeId,
    projection: &Projection,
) -> Option<Vec<usize>> {
    let (order, over_index) = reorder(items, dragged_id, over_id)?;
    let index = order[..over_index]
        .iter()
        .filter(|item| item.parent_id == projection.parent_id && item.id != dragged_id)
        .count();

    let mut path = match projection.parent_id {
        Some(parent_id) => find_path(tree, parent_id)?,
        None => Vec::new(),
    };
    path.push(index);
    Some(path)
}

fn indent_steps(offset_x: f64, indent_width: f64) -> i64 {
    if !(indent_width.is_finite() && indent_width > 0.0) {
        return 0;
    }
    // `as` saturates on overflow and maps NaN to zero.
    (offset_x / indent_width).round() as i64
}

/// The visible rows as they would read with the dragged row (and its
/// descendants removed from view) placed at the hovered row's index.
fn reorder(
    items: &[FlattenedItem],
    dragged_id: NodeId,
    over_id: NodeId,
) -> Option<(Vec<&FlattenedItem>, usize)> {
    let dragged_index = items.iter().position(|item| item.id == dragged_id)?;
    let dragged_depth = items[dragged_index].depth;
    let subtree_end = items[dragged_index + 1..]
        .iter()
        .position(|item| item.depth <= dragged_depth)
        .map_or(items.len(), |offset| dragged_index + 1 + offset);

    let mut order: Vec<&FlattenedItem> = items[..dragged_index + 1]
        .iter()
        .chain(&items[subtree_end..])
        .collect();
    let over_index = order.iter().position(|item| item.id == over_id)?;

    let dragged = order.remove(dragged_index);
    order.insert(over_index, dragged);
    Some((order, over_index))
}

// ── Tests ────────────────────────────────────────────────────────────
