use crate::models::Task;
use crate::utils::date::start_of_local_day;
use chrono::{DateTime, Duration, Utc};

/// Five tasks over three machines starting at 08:00 local time on the day
/// of `now`. ORD001 and ORD002 each form a two-step route.
pub fn demo_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let base = start_of_local_day(now).unwrap_or(now) + Duration::hours(8);
    let at = |minutes: i64| base + Duration::minutes(minutes);

    let rows: [(&str, &str, &str, i64, i64, i64); 5] = [
        ("1", "ORD001", "Maszyna A", 0, 120, 100),
        ("2", "ORD001", "Maszyna B", 150, 240, 100),
        ("3", "ORD002", "Maszyna A", 180, 300, 50),
        ("4", "ORD003", "Maszyna C", 60, 360, 200),
        ("5", "ORD002", "Maszyna C", 390, 480, 50),
    ];

    rows.iter()
        .map(|&(id, order_no, resource, start, end, qty)| {
            let mut task = Task::new(id, order_no, resource, at(start), at(end));
            task.qty = Some(qty);
            task
        })
        .collect()
}
