//! Filter & route engine
//!
//! # Evaluation Process
//!
//! 1. Keep tasks on the selected resources (all tasks when none are selected)
//! 2. With a search query, an exact case-insensitive order number match wins
//!    outright and becomes the focused route; otherwise order numbers are
//!    matched by substring
//! 3. Lanes are recomputed over the visible subset
//! 4. The derived window spans the visible tasks
//!
//! Typing a complete order number always yields the route view, even when
//! longer order numbers also contain it (`ORD1` vs `ORD10`).

use crate::filter::route::{order_route, route_connections, route_window};
use crate::layout::assign_lanes;
use crate::models::{RouteConnection, Task, TimeRange};
use std::collections::BTreeSet;

/// Result of one filter pass, ready for rendering
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Visible tasks with lanes assigned, in display order
    pub visible: Vec<Task>,
    /// Route edges; empty unless the search matched an order exactly
    pub connections: Vec<RouteConnection>,
    /// Window proposed by an exact route match
    pub route_window: Option<TimeRange>,
    /// Span of the visible tasks
    pub derived_window: Option<TimeRange>,
}

impl FilterOutcome {
    pub fn is_route(&self) -> bool {
        self.route_window.is_some()
    }
}

/// Apply resource and search filters to the full task collection
pub fn apply_filters(all: &[Task], resource_filter: &BTreeSet<String>, search: &str) -> FilterOutcome {
    let mut visible: Vec<Task> = all
        .iter()
        .filter(|t| resource_filter.is_empty() || resource_filter.contains(&t.resource))
        .cloned()
        .collect();

    let query = search.trim().to_lowercase();
    let mut route = None;

    if !query.is_empty() {
        let exact: Vec<Task> = visible
            .iter()
            .filter(|t| t.order_no.to_lowercase() == query)
            .cloned()
            .collect();

        if exact.is_empty() {
            visible.retain(|t| t.order_no.to_lowercase().contains(&query));
        } else {
            visible = exact;
            order_route(&mut visible);
            route = route_window(&visible);
            log::debug!("route for '{}': {} tasks", query, visible.len());
        }
    }

    assign_lanes(&mut visible);

    // Connections carry the freshly assigned lanes
    let connections = if route.is_some() {
        route_connections(&visible)
    } else {
        Vec::new()
    };

    let derived_window = TimeRange::spanning(&visible);

    FilterOutcome {
        visible,
        connections,
        route_window: route,
        derived_window,
    }
}

/// Sorted unique resource names of a task collection
pub fn resource_names(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .map(|t| t.resource.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
