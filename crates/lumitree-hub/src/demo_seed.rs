use anyhow::Result;
use rusqlite::Connection;

use lumitree_store::model::{self, NodeKind};

/// Insert a small demo hierarchy if the table is empty.
/// Returns whether anything was inserted.
pub fn seed_demo_data(conn: &Connection) -> Result<bool> {
    model::init_db(conn)?;

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(false);
    }

    let porch = model::add_record(conn, None, "Porch", NodeKind::Folder)?;
    model::set_expanded(conn, porch, true)?;
    model::add_record(conn, Some(porch), "Eaves", NodeKind::LightString)?;
    model::add_record(conn, Some(porch), "Railing", NodeKind::LightString)?;
    model::add_record(conn, Some(porch), "Porch switch", NodeKind::Switch)?;

    let yard = model::add_record(conn, None, "Yard", NodeKind::Folder)?;
    model::set_expanded(conn, yard, true)?;
    model::add_record(conn, Some(yard), "Oak tree", NodeKind::Composite)?;
    let path = model::add_record(conn, Some(yard), "Path lights", NodeKind::Folder)?;
    model::add_record(conn, Some(path), "Left", NodeKind::LightString)?;
    model::add_record(conn, Some(path), "Right", NodeKind::LightString)?;

    model::add_record(conn, None, "Garage switch", NodeKind::Switch)?;
    Ok(true)
}
