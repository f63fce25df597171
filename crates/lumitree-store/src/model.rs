use std::collections::HashSet;

use anyhow::Result;
use lumitree_core::{NodeId, Patch, TreeRecord, build_tree, diff_records, move_node};
use rusqlite::Connection;

// ── Node kinds ───────────────────────────────────────────────────────

/// What a node stands for. Only folders hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    LightString,
    Switch,
    Composite,
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::LightString => "light_string",
            NodeKind::Switch => "switch",
            NodeKind::Composite => "composite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "folder" => Some(NodeKind::Folder),
            "light_string" => Some(NodeKind::LightString),
            "switch" => Some(NodeKind::Switch),
            "composite" => Some(NodeKind::Composite),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        *self == NodeKind::Folder
    }
}

// ── Data models ──────────────────────────────────────────────────────

/// A single row of the node hierarchy.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub kind: NodeKind,
    pub sort_order: i64,
    pub expanded: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TreeRecord for NodeRecord {
    fn id(&self) -> NodeId {
        self.id
    }
    fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }
    fn order(&self) -> i64 {
        self.sort_order
    }
    fn is_container(&self) -> bool {
        self.kind.is_container()
    }
    fn set_parent_id(&mut self, parent_id: Option<NodeId>) {
        self.parent_id = parent_id;
    }
    fn set_order(&mut self, order: i64) {
        self.sort_order = order;
    }
}

// ── Database ─────────────────────────────────────────────────────────

/// Initialize the node tables.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('folder', 'light_string', 'switch', 'composite')),
            sort_order INTEGER NOT NULL DEFAULT 0,
            expanded INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS nodes_parent_id ON nodes(parent_id);

        CREATE TRIGGER IF NOT EXISTS nodes_updated_at
        AFTER UPDATE ON nodes
        BEGIN
            UPDATE nodes SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END;",
    )?;
    Ok(())
}

// ── CRUD operations ──────────────────────────────────────────────────

/// List all records in id order. Sibling ordering is left to the tree builder.
pub fn list_records(conn: &Connection) -> Result<Vec<NodeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, name, kind, sort_order, expanded, created_at, updated_at
         FROM nodes
         ORDER BY id ASC",
    )?;
    let records = stmt
        .query_map([], |row| {
            let kind_str: String = row.get(3)?;
            Ok(NodeRecord {
                id: row.get(0)?,
                parent_id: row.get(1)?,
                name: row.get(2)?,
                kind: NodeKind::from_str(&kind_str).unwrap_or(NodeKind::LightString),
                sort_order: row.get(4)?,
                expanded: row.get::<_, i64>(5)? != 0,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Add a new record after its last sibling. Returns the new record's ID.
pub fn add_record(
    conn: &Connection,
    parent_id: Option<NodeId>,
    name: &str,
    kind: NodeKind,
) -> Result<NodeId> {
    let next_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM nodes WHERE parent_id IS ?1",
        rusqlite::params![parent_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO nodes (parent_id, name, kind, sort_order) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![parent_id, name, kind.as_str(), next_order],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rename a record.
pub fn rename_record(conn: &Connection, id: NodeId, new_name: &str) -> Result<()> {
    conn.execute(
        "UPDATE nodes SET name = ?1 WHERE id = ?2",
        rusqlite::params![new_name, id],
    )?;
    Ok(())
}

/// Delete a record (and all children via CASCADE).
pub fn delete_record(conn: &Connection, id: NodeId) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute("DELETE FROM nodes WHERE id = ?1", rusqlite::params![id])?;
    Ok(())
}

/// Update the expanded state of a folder.
pub fn set_expanded(conn: &Connection, id: NodeId, expanded: bool) -> Result<()> {
    conn.execute(
        "UPDATE nodes SET expanded = ?1 WHERE id = ?2",
        rusqlite::params![expanded as i64, id],
    )?;
    Ok(())
}

/// Ids of all folders currently marked expanded.
pub fn expanded_ids(conn: &Connection) -> Result<HashSet<NodeId>> {
    let mut stmt = conn.prepare("SELECT id FROM nodes WHERE expanded != 0")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(ids)
}

// ── Patch writes ─────────────────────────────────────────────────────

/// Write a patch list in one transaction. Only present fields are written.
/// Returns the number of rows updated.
pub fn apply_patches(conn: &Connection, patches: &[Patch]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let updated = write_patches(&tx, patches)?;
    tx.commit()?;
    tracing::info!("Committed {} patches ({} rows)", patches.len(), updated);
    Ok(updated)
}

/// Move a record to `destination` (a structural path in the current tree)
/// and persist only the positions that changed.
///
/// Reads, moves and writes inside one transaction. A rejected move (cycle,
/// unknown id, bad destination) returns the engine's error and writes nothing.
pub fn move_record(conn: &Connection, id: NodeId, destination: &[usize]) -> Result<Vec<Patch>> {
    let tx = conn.unchecked_transaction()?;
    let records = list_records(&tx)?;
    let tree = build_tree(&records);
    let moved = move_node(&tree, id, destination)?;

    let patches = diff_records(&records, &moved);
    let updated = write_patches(&tx, &patches)?;
    tx.commit()?;

    tracing::info!(
        "Moved node {} to {:?}: {} patches ({} rows)",
        id,
        destination,
        patches.len(),
        updated
    );
    Ok(patches)
}

fn write_patches(conn: &Connection, patches: &[Patch]) -> Result<usize> {
    let mut updated = 0;
    for patch in patches {
        updated += match (patch.parent_id, patch.order) {
            (Some(parent_id), Some(order)) => conn.execute(
                "UPDATE nodes SET parent_id = ?1, sort_order = ?2 WHERE id = ?3",
                rusqlite::params![parent_id, order, patch.id],
            )?,
            (Some(parent_id), None) => conn.execute(
                "UPDATE nodes SET parent_id = ?1 WHERE id = ?2",
                rusqlite::params![parent_id, patch.id],
            )?,
            (None, Some(order)) => conn.execute(
                "UPDATE nodes SET sort_order = ?1 WHERE id = ?2",
                rusqlite::params![order, patch.id],
            )?,
            (None, None) => 0,
        };
    }
    Ok(updated)
}

// ── Tests ────────────────────────────────────────────────────────────
