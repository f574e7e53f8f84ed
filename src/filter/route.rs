//! Route derivation
//!
//! A route is every task of one order, in process order. Two tasks compare
//! by operation number when both carry one (leading digits, so "20a" is 20)
//! and by start time otherwise. That pairwise rule is not transitive once
//! numbered and unnumbered tasks mix, so the route is built by stable
//! insertion: each task in turn moves left past every earlier task that
//! compares greater.

use crate::models::{RouteConnection, Task, TimeRange};
use std::cmp::Ordering;

/// Margin added on each side of a route's span, as a fraction of the span
pub const ROUTE_WINDOW_MARGIN: f64 = 0.1;

/// Operation number when both tasks have one, else start time
pub fn compare_route_steps(a: &Task, b: &Task) -> Ordering {
    match (a.op_number(), b.op_number()) {
        (Some(op_a), Some(op_b)) => op_a.cmp(&op_b),
        _ => a.start_time.cmp(&b.start_time),
    }
}

/// Sort tasks of one order into route order
pub fn order_route(route: &mut [Task]) {
    for i in 1..route.len() {
        let mut j = i;
        while j > 0 && compare_route_steps(&route[j - 1], &route[j]) == Ordering::Greater {
            route.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Sequential pairs of a sorted route: n tasks give n-1 connections
pub fn route_connections(route: &[Task]) -> Vec<RouteConnection> {
    route
        .windows(2)
        .map(|pair| RouteConnection {
            from: pair[0].clone(),
            to: pair[1].clone(),
        })
        .collect()
}

/// Route span widened by the route margin on each side
pub fn route_window(route: &[Task]) -> Option<TimeRange> {
    TimeRange::spanning(route).map(|span| span.widened(ROUTE_WINDOW_MARGIN))
}
