use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{NodeId, TreeRecord};

// ── TreeNode ─────────────────────────────────────────────────────────

/// A node in the in-memory tree: a view over one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        id: NodeId,
    },
    Container {
        id: NodeId,
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn leaf(id: NodeId) -> Self {
        TreeNode::Leaf { id }
    }

    pub fn container(id: NodeId, children: Vec<TreeNode>) -> Self {
        TreeNode::Container { id, children }
    }

    pub fn id(&self) -> NodeId {
        match self {
            TreeNode::Leaf { id } | TreeNode::Container { id, .. } => *id,
        }
    }

    /// Children in sibling order. Always empty for a leaf.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Leaf { .. } => &[],
            TreeNode::Container { children, .. } => children,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TreeNode::Container { .. })
    }
}

// ── Tree ─────────────────────────────────────────────────────────────

/// An immutable snapshot: the ordered root-level nodes.
///
/// Every operation that changes structure returns a new `Tree`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    roots: Vec<TreeNode>,
}

impl Tree {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<TreeNode> {
        self.roots
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        let mut count = 0;
        visit(&self.roots, None, 0, &mut |_, _, _, _| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// All node ids in depth-first pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        visit(&self.roots, None, 0, &mut |node, _, _, _| ids.push(node.id()));
        ids
    }
}

// ── Tree building ────────────────────────────────────────────────────

/// Structural attributes of one record, detached from its domain payload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub order: i64,
    pub is_container: bool,
}

/// Build a tree from a flat list of records.
///
/// Siblings are sorted by `order`, ties keep record order. Malformed input is
/// normalized rather than rejected: a dangling parent, a parent that is a
/// leaf, or a parent cycle promotes the record to root level.
pub fn build_tree<R: TreeRecord>(records: &[R]) -> Tree {
    let slots: Vec<Slot> = records
        .iter()
        .map(|r| Slot {
            id: r.id(),
            parent_id: r.parent_id(),
            order: r.order(),
            is_container: r.is_container(),
        })
        .collect();
    assemble(&slots)
}

/// Group slots into sibling buckets and expand them recursively from the roots.
pub(crate) fn assemble(slots: &[Slot]) -> Tree {
    let mut index_of: HashMap<NodeId, usize> = HashMap::with_capacity(slots.len());
    let mut duplicate = vec![false; slots.len()];
    for (i, slot) in slots.iter().enumerate() {
        if index_of.contains_key(&slot.id) {
            debug!(id = slot.id, "duplicate record id, keeping first occurrence");
            duplicate[i] = true;
        } else {
            index_of.insert(slot.id, i);
        }
    }

    let parents: Vec<Option<usize>> = slots
        .iter()
        .map(|slot| {
            let pid = slot.parent_id?;
            match index_of.get(&pid) {
                None => {
                    debug!(id = slot.id, parent_id = pid, "dangling parent, promoting to root");
                    None
                }
                Some(&p) if !slots[p].is_container => {
                    debug!(id = slot.id, parent_id = pid, "parent is a leaf, promoting to root");
                    None
                }
                Some(&p) => Some(p),
            }
        })
        .collect();

    let mut buckets: HashMap<Option<usize>, Vec<usize>> = HashMap::new();
    for i in (0..slots.len()).filter(|&i| !duplicate[i]) {
        buckets.entry(parents[i]).or_default().push(i);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|&i| (slots[i].order, i));
    }

    let mut placed = vec![false; slots.len()];
    let mut roots: Vec<(i64, usize, TreeNode)> = Vec::new();
    for &i in buckets.get(&None).map(Vec::as_slice).unwrap_or_default() {
        let node = expand(i, slots, &buckets, &mut placed);
        roots.push((slots[i].order, i, node));
    }

    // Whatever is still unplaced hangs off a parent cycle. Break each cycle
    // at the first member reached by walking up from the earliest record.
    while let Some(start) = (0..slots.len()).find(|&i| !placed[i] && !duplicate[i]) {
        let member = cycle_member(start, &parents);
        debug!(id = slots[member].id, "parent cycle, promoting to root");
        let node = expand(member, slots, &buckets, &mut placed);
        roots.push((slots[member].order, member, node));
    }

    roots.sort_by_key(|&(order, i, _)| (order, i));
    Tree::new(roots.into_iter().map(|(_, _, node)| node).collect())
}

fn expand(
    i: usize,
    slots: &[Slot],
    buckets: &HashMap<Option<usize>, Vec<usize>>,
    placed: &mut [bool],
) -> TreeNode {
    placed[i] = true;
    let slot = &slots[i];
    if !slot.is_container {
        return TreeNode::leaf(slot.id);
    }
    let mut children = Vec::new();
    for &c in buckets.get(&Some(i)).map(Vec::as_slice).unwrap_or_default() {
        if !placed[c] {
            children.push(expand(c, slots, buckets, placed));
        }
    }
    TreeNode::container(slot.id, children)
}

/// Walk parent links from `start` until a slot repeats; that slot lies on the cycle.
fn cycle_member(start: usize, parents: &[Option<usize>]) -> usize {
    let mut seen = vec![false; parents.len()];
    let mut current = start;
    while !seen[current] {
        seen[current] = true;
        match parents[current] {
            Some(p) => current = p,
            None => return current,
        }
    }
    current
}

// ── Tree traversal functions ─────────────────────────────────────────

/// Depth-first pre-order walk handing each node its parent id, sibling index and depth.
pub(crate) fn visit<'a, F>(nodes: &'a [TreeNode], parent_id: Option<NodeId>, depth: usize, f: &mut F)
where
    F: FnMut(&'a TreeNode, Option<NodeId>, usize, usize),
{
    for (index, node) in nodes.iter().enumerate() {
        f(node, parent_id, index, depth);
        visit(node.children(), Some(node.id()), depth + 1, f);
    }
}

/// Structural path of the node with the given id, or `None` if absent.
pub fn find_path(tree: &Tree, id: NodeId) -> Option<Vec<usize>> {
    fn search(nodes: &[TreeNode], id: NodeId, path: &mut Vec<usize>) -> bool {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            if node.id() == id || search(node.children(), id, path) {
                return true;
            }
            path.pop();
        }
        false
    }
    let mut path = Vec::new();
    search(tree.roots(), id, &mut path).then_some(path)
}

/// Node at the given path. `None` for an empty path, an out-of-bounds index,
/// or a path that tries to descend through a leaf.
pub fn node_at_path<'a>(tree: &'a Tree, path: &[usize]) -> Option<&'a TreeNode> {
    let (&last, init) = path.split_last()?;
    let mut nodes = tree.roots();
    for &index in init {
        match nodes.get(index)? {
            TreeNode::Container { children, .. } => nodes = children,
            TreeNode::Leaf { .. } => return None,
        }
    }
    nodes.get(last)
}

/// Find a node by id.
pub fn find_node(tree: &Tree, id: NodeId) -> Option<&TreeNode> {
    fn search(nodes: &[TreeNode], id: NodeId) -> Option<&TreeNode> {
        for node in nodes {
            if node.id() == id {
                return Some(node);
            }
            if let Some(found) = search(node.children(), id) {
                return Some(found);
            }
        }
        None
    }
    search(tree.roots(), id)
}

/// Id of the container holding `id`. `None` both for root-level nodes and
/// for ids that are not in the tree.
pub fn parent_id_of(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let path = find_path(tree, id)?;
    let (_, parent_path) = path.split_last()?;
    node_at_path(tree, parent_path).map(TreeNode::id)
}

/// Container ids from the root down to (but not including) `id`.
pub fn ancestors(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let Some(path) = find_path(tree, id) else {
        return Vec::new();
    };
    (1..path.len())
        .filter_map(|len| node_at_path(tree, &path[..len]).map(TreeNode::id))
        .collect()
}

/// Ids of every node below `id`, in pre-order.
pub fn descendant_ids(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut ids = Vec::new();
    if let Some(node) = find_node(tree, id) {
        visit(node.children(), Some(id), 0, &mut |n, _, _, _| ids.push(n.id()));
    }
    ids
}

/// Mutable sibling list under `parent_path` (the roots for an empty path).
/// `None` when the path is out of bounds or ends on a leaf.
pub(crate) fn siblings_mut<'a>(
    roots: &'a mut Vec<TreeNode>,
    parent_path: &[usize],
) -> Option<&'a mut Vec<TreeNode>> {
    let mut nodes = roots;
    for &index in parent_path {
        match nodes.get_mut(index)? {
            TreeNode::Container { children, .. } => nodes = children,
            TreeNode::Leaf { .. } => return None,
        }
    }
    Some(nodes)
}

// ── Tests ────────────────────────────────────────────────────────────
