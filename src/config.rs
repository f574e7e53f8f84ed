// Configuration file handling
//
// The rc file lives at ~/.gantt/rc and holds `key=value` lines:
//
//   data.location=./settings.db   settings database (relative to the rc dir)
//   import.timeout=10             seconds without decoder progress before
//                                 the import is force-completed
//   import.chunk_size=500         rows per decoder message

use crate::import::decoder::DEFAULT_CHUNK_SIZE;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_IMPORT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub import_timeout: Duration,
    pub chunk_size: usize,
}

impl Config {
    /// Directory holding the rc file and the default settings database
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".gantt"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Defaults rooted at `dir`
    pub fn defaults_in(dir: &Path) -> Self {
        Self {
            data_location: dir.join("settings.db"),
            import_timeout: Duration::from_secs(DEFAULT_IMPORT_TIMEOUT_SECS),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Load ~/.gantt/rc, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let path = dir.join("rc");
        if !path.exists() {
            return Ok(Self::defaults_in(&dir));
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&text, &dir).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse rc text. Relative paths resolve against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let mut config = Self::defaults_in(base_dir);

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                anyhow::bail!("line {}: expected key=value", line_no + 1);
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() { base_dir.join(path) } else { path };
                }
                "import.timeout" => {
                    let secs: u64 = value
                        .parse()
                        .with_context(|| format!("line {}: import.timeout must be a whole number of seconds", line_no + 1))?;
                    if secs == 0 {
                        anyhow::bail!("line {}: import.timeout must be positive", line_no + 1);
                    }
                    config.import_timeout = Duration::from_secs(secs);
                }
                "import.chunk_size" => {
                    let size: usize = value
                        .parse()
                        .with_context(|| format!("line {}: import.chunk_size must be a number", line_no + 1))?;
                    if size == 0 {
                        anyhow::bail!("line {}: import.chunk_size must be positive", line_no + 1);
                    }
                    config.chunk_size = size;
                }
                other => log::warn!("ignoring unknown config key '{}'", other),
            }
        }

        Ok(config)
    }
}
