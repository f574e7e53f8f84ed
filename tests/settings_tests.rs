use gantt_planner::config::Config;
use gantt_planner::db::DbConnection;
use gantt_planner::repo::{SettingsError, SettingsStore, SqliteSettings};
use gantt_planner::session::prefs::{KEY_RANGE_END, KEY_RANGE_START, KEY_ZOOM_LEVEL, ZOOM_MAX, ZOOM_MIN};
use gantt_planner::session::{Session, WindowState};
use std::fs;
use tempfile::TempDir;

fn open(path: &std::path::Path) -> SqliteSettings {
    SqliteSettings::new(DbConnection::connect(path).unwrap())
}

#[test]
fn test_preferences_persist_across_sessions() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("settings.db");

    {
        let mut session = Session::new(open(&db_path)).unwrap();
        session.set_dark_mode(true).unwrap();
        session.set_preference(KEY_ZOOM_LEVEL, "180").unwrap();
        session
            .set_custom_range("01.03.2024 06:00", "02.03.2024 18:00")
            .unwrap();
    }

    let session = Session::new(open(&db_path)).unwrap();
    let prefs = session.preferences();
    assert!(prefs.dark_mode);
    assert_eq!(prefs.zoom_level, 180);
    assert_eq!(prefs.custom_start.as_deref(), Some("01.03.2024 06:00"));
    assert_eq!(prefs.custom_end.as_deref(), Some("02.03.2024 18:00"));
}

#[test]
fn test_zoom_clamped_when_stored() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("settings.db");

    let mut session = Session::new(open(&db_path)).unwrap();
    session.set_preference(KEY_ZOOM_LEVEL, "2").unwrap();
    assert_eq!(session.store().get(KEY_ZOOM_LEVEL).unwrap().as_deref(), Some("20"));

    assert_eq!(session.zoom_by(10_000).unwrap(), ZOOM_MAX);
    assert_eq!(session.zoom_by(-10_000).unwrap(), ZOOM_MIN);
}

#[test]
fn test_saved_range_reapplied() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("settings.db");

    {
        let mut store = open(&db_path);
        store.set(KEY_RANGE_START, "2024-03-01T00:00:00Z").unwrap();
        store.set(KEY_RANGE_END, "2024-03-08T00:00:00Z").unwrap();
    }

    let mut session = Session::new(open(&db_path)).unwrap();
    let range = session.apply_saved_range().unwrap().unwrap();
    assert_eq!(session.window_state(), WindowState::Explicit(range));
    assert_eq!(range.duration(), chrono::Duration::days(7));
}

#[test]
fn test_invalid_preference_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = Session::new(open(&temp_dir.path().join("s.db"))).unwrap();

    assert!(matches!(
        session.set_preference("dark_mode", "sometimes"),
        Err(SettingsError::InvalidValue { .. })
    ));
    assert!(matches!(session.set_preference("font", "mono"), Err(SettingsError::UnknownKey(_))));
    assert!(session.store().list().unwrap().is_empty());
}

#[test]
fn test_config_relative_location() {
    let temp_dir = TempDir::new().unwrap();
    let rc_dir = temp_dir.path().join(".gantt");
    fs::create_dir_all(&rc_dir).unwrap();

    let config = Config::parse("data.location=data/prefs.db\nimport.timeout=2\n", &rc_dir).unwrap();
    assert_eq!(config.data_location, rc_dir.join("data/prefs.db"));

    // The database and its directory are created on first connect
    let _store = open(&config.data_location);
    assert!(config.data_location.exists());
}
