use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings storage failed: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidValue { key: String, value: String },
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
}

/// Opaque key-value persistence for user preferences
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Store that lives only as long as the session
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings table in the SQLite database opened by `DbConnection`
pub struct SqliteSettings {
    conn: Connection,
}

impl SqliteSettings {
    /// Wrap a connection whose schema is already initialized
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// All stored settings, sorted by key
    pub fn list(&self) -> Result<Vec<(String, String)>, SettingsError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut settings = Vec::new();
        for row in rows {
            settings.push(row?);
        }
        Ok(settings)
    }
}

impl SettingsStore for SqliteSettings {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO settings (key, value, modified_ts) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, modified_ts = excluded.modified_ts",
            rusqlite::params![key, value, now],
        )?;
        log::debug!("setting {} = {}", key, value);
        Ok(())
    }
}
