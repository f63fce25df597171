//! Hierarchical node tree engine.
//!
//! Builds an immutable tree from a flat record list, addresses nodes by
//! structural path, moves nodes without ever creating a cycle, projects drag
//! gestures onto a nesting depth, and computes the minimal patch list between
//! two tree snapshots. Nothing in here touches storage or UI.

pub mod flatten;
pub mod moves;
pub mod patch;
pub mod projection;
pub mod record;
pub mod tree;

pub use flatten::{FlattenedItem, flatten};
pub use moves::{MoveError, move_node};
pub use patch::{Patch, apply_patches, apply_to_records, diff, diff_records};
pub use projection::{Projection, ProjectionConfig, project, projected_destination};
pub use record::{NodeId, TreeRecord};
pub use tree::{
    Tree, TreeNode, ancestors, build_tree, descendant_ids, find_node, find_path, node_at_path,
    parent_id_of,
};
