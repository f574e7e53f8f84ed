// Schema versioning for the settings database. The applied version lives in
// SQLite's `user_version` pragma; each step runs in its own transaction.

use rusqlite::{Connection, Result};

/// Ordered schema steps; entry `n` upgrades version `n` to `n + 1`
const STEPS: &[&str] = &[
    // 1: key-value preferences
    "CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        modified_ts INTEGER NOT NULL
    );",
];

pub const CURRENT_VERSION: u32 = STEPS.len() as u32;

pub struct MigrationManager;

impl MigrationManager {
    /// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
    pub fn initialize(conn: &Connection) -> Result<()> {
        let from = Self::get_version(conn)?;
        for (index, sql) in STEPS.iter().enumerate().skip(from as usize) {
            let target = index as u32 + 1;
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(sql)?;
            tx.pragma_update(None, "user_version", target)?;
            tx.commit()?;
            log::debug!("settings schema upgraded to v{}", target);
        }
        Ok(())
    }

    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
    }
}
