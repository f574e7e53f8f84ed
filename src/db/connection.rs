use crate::db::migrations::MigrationManager;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Opens the preferences database with its schema in place
pub struct DbConnection;

impl DbConnection {
    /// Open `path`, creating the file and any missing directories first
    pub fn connect(path: &Path) -> Result<Connection> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create settings directory {}", dir.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Cannot open settings database {}", path.display()))?;
        Self::prepare(conn)
    }

    pub fn connect_in_memory() -> Result<Connection> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Connection> {
        MigrationManager::initialize(&conn).context("Settings schema upgrade failed")?;
        Ok(conn)
    }
}
