//! Lane assignment
//!
//! Greedy interval partitioning per resource: tasks are visited in start
//! order and each one takes the lowest-numbered lane that is free at its
//! start time. A lane is free once its last task has ended, so back-to-back
//! tasks share a lane. The number of lanes used equals the largest number
//! of tasks running at the same instant on that resource.

use crate::models::Task;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Assign `lane` on every task, per resource. Slice order is unchanged;
/// any previous lane values are ignored.
pub fn assign_lanes(tasks: &mut [Task]) {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, task) in tasks.iter().enumerate() {
        groups.entry(task.resource.clone()).or_default().push(index);
    }

    for indices in groups.values_mut() {
        // Stable: equal start times keep input order
        indices.sort_by_key(|&i| tasks[i].start_time);

        let mut lane_ends: Vec<DateTime<Utc>> = Vec::new();
        for &i in indices.iter() {
            let start = tasks[i].start_time;
            let lane = match lane_ends.iter().position(|end| *end <= start) {
                Some(lane) => lane,
                None => {
                    lane_ends.push(start);
                    lane_ends.len() - 1
                }
            };
            lane_ends[lane] = tasks[i].end_time;
            tasks[i].lane = lane;
        }
    }
}

/// Number of lanes used per resource, keyed by resource name
pub fn lane_counts(tasks: &[Task]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        let count = counts.entry(task.resource.clone()).or_insert(0);
        *count = (*count).max(task.lane + 1);
    }
    counts
}
