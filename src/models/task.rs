use chrono::{DateTime, Duration, Utc};
use crate::utils::number::parse_leading_int;
use serde::{Deserialize, Serialize};

/// A scheduled unit of work on one resource
///
/// `lane` is derived: it is written only by the lane assignor and is
/// recomputed on every layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub order_no: String,
    pub resource: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_no: Option<String>,
    #[serde(default)]
    pub lane: usize,
}

impl Task {
    /// Create a task with no optional attributes on lane 0
    pub fn new(
        id: impl Into<String>,
        order_no: impl Into<String>,
        resource: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            order_no: order_no.into(),
            resource: resource.into(),
            start_time,
            end_time,
            qty: None,
            op_no: None,
            product: None,
            part_no: None,
            lane: 0,
        }
    }

    /// Build the stable task id from the order number and the operation
    /// number, falling back to the source row index.
    pub fn derive_id(order_no: &str, op_no: Option<&str>, row_index: usize) -> String {
        match op_no {
            Some(op) => format!("{}-{}", order_no, op),
            None => format!("{}-{}", order_no, row_index),
        }
    }

    /// Leading integer of the operation number ("30a" -> 30)
    pub fn op_number(&self) -> Option<i64> {
        self.op_no.as_deref().and_then(parse_leading_int)
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Duration rounded to whole minutes
    pub fn duration_minutes(&self) -> i64 {
        let millis = self.duration().num_milliseconds();
        (millis as f64 / 60_000.0).round() as i64
    }

    /// Half-open interval overlap: back-to-back tasks do not overlap.
    pub fn overlaps(&self, other: &Task) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }

    /// Bar label: order, resource and quantity when known
    pub fn label(&self) -> String {
        match self.qty {
            Some(qty) => format!("{} • {} • {}", self.order_no, self.resource, qty),
            None => format!("{} • {}", self.order_no, self.resource),
        }
    }
}

/// Bounds of the visible timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Smallest range covering every task, or `None` for an empty slice
    pub fn spanning(tasks: &[Task]) -> Option<Self> {
        let start = tasks.iter().map(|t| t.start_time).min()?;
        let end = tasks.iter().map(|t| t.end_time).max()?;
        Some(Self { start, end })
    }

    /// Widen both sides by `fraction` of the span.
    pub fn widened(&self, fraction: f64) -> Self {
        let span_ms = (self.end - self.start).num_milliseconds();
        let margin = Duration::milliseconds((span_ms as f64 * fraction) as i64);
        Self {
            start: self.start - margin,
            end: self.end + margin,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Directed edge between consecutive tasks of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConnection {
    pub from: Task,
    pub to: Task,
}
