//! User preferences persisted through a [`SettingsStore`].
//!
//! Values are stored as plain strings. A stored value that no longer parses
//! is ignored in favor of the default rather than failing the session.

use crate::repo::settings::{SettingsError, SettingsStore};
use crate::utils::date::parse_timestamp;

pub const KEY_DARK_MODE: &str = "dark_mode";
pub const KEY_ZOOM_LEVEL: &str = "zoom_level";
pub const KEY_RANGE_START: &str = "custom_range.start";
pub const KEY_RANGE_END: &str = "custom_range.end";

pub const KEYS: [&str; 4] = [KEY_DARK_MODE, KEY_ZOOM_LEVEL, KEY_RANGE_START, KEY_RANGE_END];

/// Zoom in pixels per hour
pub const ZOOM_MIN: u32 = 20;
pub const ZOOM_MAX: u32 = 500;
pub const ZOOM_DEFAULT: u32 = 100;
pub const ZOOM_STEP: i32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub dark_mode: bool,
    pub zoom_level: u32,
    /// Raw custom range strings as last entered
    pub custom_start: Option<String>,
    pub custom_end: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            zoom_level: ZOOM_DEFAULT,
            custom_start: None,
            custom_end: None,
        }
    }
}

pub fn clamp_zoom(level: i64) -> u32 {
    level.clamp(ZOOM_MIN as i64, ZOOM_MAX as i64) as u32
}

impl Preferences {
    pub fn load<S: SettingsStore>(store: &S) -> Result<Self, SettingsError> {
        let mut prefs = Self::default();

        if let Some(raw) = store.get(KEY_DARK_MODE)? {
            match parse_bool(&raw) {
                Some(value) => prefs.dark_mode = value,
                None => log::warn!("ignoring stored {}='{}'", KEY_DARK_MODE, raw),
            }
        }
        if let Some(raw) = store.get(KEY_ZOOM_LEVEL)? {
            match raw.trim().parse::<i64>() {
                Ok(level) => prefs.zoom_level = clamp_zoom(level),
                Err(_) => log::warn!("ignoring stored {}='{}'", KEY_ZOOM_LEVEL, raw),
            }
        }
        prefs.custom_start = store.get(KEY_RANGE_START)?;
        prefs.custom_end = store.get(KEY_RANGE_END)?;

        Ok(prefs)
    }

    pub fn save<S: SettingsStore>(&self, store: &mut S) -> Result<(), SettingsError> {
        store.set(KEY_DARK_MODE, if self.dark_mode { "true" } else { "false" })?;
        store.set(KEY_ZOOM_LEVEL, &self.zoom_level.to_string())?;
        if let Some(start) = &self.custom_start {
            store.set(KEY_RANGE_START, start)?;
        }
        if let Some(end) = &self.custom_end {
            store.set(KEY_RANGE_END, end)?;
        }
        Ok(())
    }

    /// Current value of a preference key as text
    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        match key {
            KEY_DARK_MODE => Ok(Some(self.dark_mode.to_string())),
            KEY_ZOOM_LEVEL => Ok(Some(self.zoom_level.to_string())),
            KEY_RANGE_START => Ok(self.custom_start.clone()),
            KEY_RANGE_END => Ok(self.custom_end.clone()),
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }

    /// Validate and apply a textual value. Zoom is clamped, not rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            KEY_DARK_MODE => self.dark_mode = parse_bool(value).ok_or_else(invalid)?,
            KEY_ZOOM_LEVEL => {
                let level: i64 = value.trim().parse().map_err(|_| invalid())?;
                self.zoom_level = clamp_zoom(level);
            }
            KEY_RANGE_START | KEY_RANGE_END => {
                parse_timestamp(value).map_err(|_| invalid())?;
                let slot = if key == KEY_RANGE_START { &mut self.custom_start } else { &mut self.custom_end };
                *slot = Some(value.trim().to_string());
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Step zoom by `delta` px/h within bounds
    pub fn zoom_by(&mut self, delta: i32) -> u32 {
        self.zoom_level = clamp_zoom(self.zoom_level as i64 + delta as i64);
        self.zoom_level
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
