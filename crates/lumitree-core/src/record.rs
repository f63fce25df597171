/// Identifier of a record, and of the tree node that views it.
pub type NodeId = i64;

// ── TreeRecord trait ─────────────────────────────────────────────────

/// Trait that any flat record type must implement to be built into a tree.
///
/// The persistence layer owns the records. The engine reads the four
/// structural attributes and only ever writes `parent_id` and `order`.
pub trait TreeRecord {
    fn id(&self) -> NodeId;
    fn parent_id(&self) -> Option<NodeId>;
    /// Sort key among siblings. Ties keep the original record order.
    fn order(&self) -> i64;
    fn is_container(&self) -> bool;

    fn set_parent_id(&mut self, parent_id: Option<NodeId>);
    fn set_order(&mut self, order: i64);
}
