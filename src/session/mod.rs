//! Session state
//!
//! A [`Session`] owns the full task collection, the filter inputs, the
//! time-window state and the preference store. Every mutating operation
//! ends in [`Session::refresh`], so [`Session::view`] always reflects the
//! current inputs.
//!
//! # Window state
//!
//! The window is either `Unset` (the derived span of the visible tasks is
//! shown) or `Explicit`. Loading data or clearing resets it to `Unset`.
//! Presets, a custom range and an exact route match pin it.

pub mod demo;
pub mod prefs;

use crate::filter::{apply_filters, resource_names};
use crate::import::reconcile::reconcile_rows;
use crate::import::worker::{ImportError, ImportOutcome};
use crate::models::{ColumnMapping, MappingError, Record, RouteConnection, Task, TimeRange};
use crate::repo::settings::{SettingsError, SettingsStore};
use crate::utils::date::{local_day_offset, parse_timestamp, start_of_local_day};
use crate::utils::fuzzy::filter_resource_names;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use demo::demo_tasks;
pub use prefs::Preferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Unset,
    Explicit(TimeRange),
}

/// Fixed windows measured from local midnight today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Today,
    SevenDays,
    ThirtyDays,
}

impl Preset {
    pub fn days(&self) -> i64 {
        match self {
            Preset::Today => 1,
            Preset::SevenDays => 7,
            Preset::ThirtyDays => 30,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Today => "today",
            Preset::SevenDays => "7days",
            Preset::ThirtyDays => "30days",
        }
    }
}

impl FromStr for Preset {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(Preset::Today),
            "7days" | "week" => Ok(Preset::SevenDays),
            "30days" | "month" => Ok(Preset::ThirtyDays),
            other => Err(RangeError::UnknownPreset(other.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum RangeError {
    #[error("cannot parse range start '{0}'")]
    InvalidStart(String),
    #[error("cannot parse range end '{0}'")]
    InvalidEnd(String),
    #[error("range start must be before its end")]
    NotIncreasing,
    #[error("unknown preset '{0}' (expected today, 7days or 30days)")]
    UnknownPreset(String),
    #[error("local midnight does not exist today")]
    NoLocalMidnight,
    #[error(transparent)]
    Storage(#[from] SettingsError),
}

/// Render-ready output of the last refresh
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Visible tasks with lanes, in display order
    pub tasks: Vec<Task>,
    pub connections: Vec<RouteConnection>,
    /// Window to render: the pinned range, else the derived span
    pub window: Option<TimeRange>,
    pub route_active: bool,
}

/// Result of committing an import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub accepted: usize,
    pub dropped: usize,
    /// The watchdog cut the stream short
    pub partial: bool,
}

pub struct Session<S: SettingsStore> {
    store: S,
    prefs: Preferences,
    tasks: Vec<Task>,
    resource_filter: BTreeSet<String>,
    search: String,
    window: WindowState,
    selected: Option<String>,
    view: SessionView,
}

impl<S: SettingsStore> Session<S> {
    pub fn new(store: S) -> Result<Self, SettingsError> {
        let prefs = Preferences::load(&store)?;
        Ok(Self {
            store,
            prefs,
            tasks: Vec::new(),
            resource_filter: BTreeSet::new(),
            search: String::new(),
            window: WindowState::Unset,
            selected: None,
            view: SessionView::default(),
        })
    }

    /// Replace the collection. Filters are kept; the window returns to auto.
    pub fn load_tasks(&mut self, tasks: Vec<Task>) {
        log::info!("loaded {} tasks", tasks.len());
        self.tasks = tasks;
        self.selected = None;
        self.window = WindowState::Unset;
        self.refresh();
    }

    /// Reconcile decoded rows and load the result
    pub fn import_rows(&mut self, rows: &[Record], mapping: Option<&ColumnMapping>) -> Result<ImportSummary, MappingError> {
        let report = reconcile_rows(rows, mapping)?;
        let summary = ImportSummary {
            total_rows: report.total_rows,
            accepted: report.tasks.len(),
            dropped: report.dropped,
            partial: false,
        };
        self.load_tasks(report.tasks);
        Ok(summary)
    }

    /// Commit the outcome of a background import. Failures and
    /// cancellations leave the session untouched.
    pub fn finish_import(&mut self, outcome: ImportOutcome, mapping: Option<&ColumnMapping>) -> Result<ImportSummary, ImportError> {
        match outcome {
            ImportOutcome::Completed { rows, partial } => {
                let mut summary = self.import_rows(&rows, mapping)?;
                summary.partial = partial;
                Ok(summary)
            }
            ImportOutcome::Failed(error) => Err(error),
            ImportOutcome::Cancelled => Err(ImportError::Cancelled),
        }
    }

    pub fn load_demo(&mut self, now: DateTime<Utc>) {
        self.load_tasks(demo_tasks(now));
    }

    /// Drop all data and reset every filter
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.resource_filter.clear();
        self.search.clear();
        self.selected = None;
        self.window = WindowState::Unset;
        self.refresh();
    }

    pub fn set_resource_filter<I, T>(&mut self, resources: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.resource_filter = resources.into_iter().map(Into::into).collect();
        self.refresh();
    }

    /// Add or remove one resource from the filter
    pub fn toggle_resource(&mut self, resource: &str) {
        if !self.resource_filter.remove(resource) {
            self.resource_filter.insert(resource.to_string());
        }
        self.refresh();
    }

    /// Add every resource whose name contains `query`; returns how many
    /// resources matched
    pub fn select_resources_matching(&mut self, query: &str) -> usize {
        let names = self.resources();
        let matched = filter_resource_names(&names, query);
        let count = matched.len();
        self.resource_filter.extend(matched.into_iter().map(str::to_string));
        self.refresh();
        count
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
        self.refresh();
    }

    /// Pin a preset window and clear the search
    pub fn apply_preset(&mut self, preset: Preset, now: DateTime<Utc>) -> Result<TimeRange, RangeError> {
        let start = start_of_local_day(now).ok_or(RangeError::NoLocalMidnight)?;
        let end = local_day_offset(now, preset.days()).ok_or(RangeError::NoLocalMidnight)?;
        let range = TimeRange::new(start, end);
        self.pin_window(range);
        Ok(range)
    }

    /// Pin a window from two raw date strings and remember them. An invalid
    /// range leaves the current window in place.
    pub fn set_custom_range(&mut self, start: &str, end: &str) -> Result<TimeRange, RangeError> {
        let range = parse_range(start, end)?;
        self.update_prefs(|prefs| {
            prefs.custom_start = Some(start.trim().to_string());
            prefs.custom_end = Some(end.trim().to_string());
            Ok(())
        })?;
        self.pin_window(range);
        Ok(range)
    }

    /// Re-apply the remembered custom range, if both ends are stored
    pub fn apply_saved_range(&mut self) -> Result<Option<TimeRange>, RangeError> {
        match (self.prefs.custom_start.clone(), self.prefs.custom_end.clone()) {
            (Some(start), Some(end)) => self.set_custom_range(&start, &end).map(Some),
            _ => Ok(None),
        }
    }

    fn pin_window(&mut self, range: TimeRange) {
        self.window = WindowState::Explicit(range);
        self.search.clear();
        self.refresh();
    }

    /// Recompute the view from the current inputs
    pub fn refresh(&mut self) {
        let outcome = apply_filters(&self.tasks, &self.resource_filter, &self.search);

        if let Some(route) = outcome.route_window {
            self.window = WindowState::Explicit(route);
        }
        let window = match self.window {
            WindowState::Explicit(range) => Some(range),
            WindowState::Unset => outcome.derived_window,
        };

        self.view = SessionView {
            route_active: outcome.is_route(),
            tasks: outcome.visible,
            connections: outcome.connections,
            window,
        };
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn window_state(&self) -> WindowState {
        self.window
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn resource_filter(&self) -> &BTreeSet<String> {
        &self.resource_filter
    }

    /// The full collection, unfiltered
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Sorted unique resources of the full collection
    pub fn resources(&self) -> Vec<String> {
        resource_names(&self.tasks)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Select a task for the details view; `None` when the id is unknown
    pub fn select_task(&mut self, id: &str) -> Option<&Task> {
        let found = self.tasks.iter().position(|t| t.id == id)?;
        self.selected = Some(id.to_string());
        self.tasks.get(found)
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected.as_deref().and_then(|id| self.task(id))
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Validate, apply and persist one preference
    pub fn set_preference(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.update_prefs(|prefs| prefs.set(key, value))
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<(), SettingsError> {
        self.update_prefs(|prefs| {
            prefs.dark_mode = enabled;
            Ok(())
        })
    }

    pub fn zoom_by(&mut self, delta: i32) -> Result<u32, SettingsError> {
        self.update_prefs(|prefs| Ok(prefs.zoom_by(delta)))
    }

    /// Apply `change` to a copy and adopt it only once the store accepted it
    fn update_prefs<T>(
        &mut self,
        change: impl FnOnce(&mut Preferences) -> Result<T, SettingsError>,
    ) -> Result<T, SettingsError> {
        let mut next = self.prefs.clone();
        let result = change(&mut next)?;
        next.save(&mut self.store)?;
        self.prefs = next;
        Ok(result)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn parse_range(start: &str, end: &str) -> Result<TimeRange, RangeError> {
    let start_ts = parse_timestamp(start).map_err(|_| RangeError::InvalidStart(start.to_string()))?;
    let end_ts = parse_timestamp(end).map_err(|_| RangeError::InvalidEnd(end.to_string()))?;
    if start_ts >= end_ts {
        return Err(RangeError::NotIncreasing);
    }
    Ok(TimeRange::new(start_ts, end_ts))
}
