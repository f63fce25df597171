use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Returns the default path of the lumitree database.
/// Location: `~/.local/share/lumitree/lumitree.db` (XDG-compliant)
pub fn db_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "lumitree").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("lumitree.db"))
}

/// Opens (or creates) the database at the default location.
pub fn open_db() -> Result<Connection> {
    open_db_at(&db_path()?)
}

/// Opens (or creates) the database at `path`, creating its directory if needed.
/// Enables WAL mode for better concurrent read performance.
pub fn open_db_at(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    tracing::debug!("Opened database at {}", path.display());
    Ok(conn)
}

/// Open an in-memory database for testing.
pub fn open_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}
