use chrono::{DateTime, Duration, TimeZone, Utc};
use gantt_planner::filter::apply_filters;
use gantt_planner::import::{reconcile, reconcile_rows};
use gantt_planner::models::{CanonicalField, CellValue, ColumnMapping, MappingError, Record, Task};
use gantt_planner::utils::date::{format_timestamp, local_datetime, parse_timestamp};
use std::collections::BTreeSet;

fn row(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), CellValue::infer(v)))
        .collect()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 12, h, m, 0).unwrap()
}

fn task(id: &str, order: &str, resource: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
    Task::new(id, order, resource, start, end)
}

#[test]
fn test_row_missing_start_is_dropped() {
    let rows: Vec<Record> = (1..=5)
        .map(|i| {
            let order = format!("ORD{}", i);
            let start = if i == 3 { String::new() } else { format!("12.02.2024 0{}:00", i) };
            let end = format!("12.02.2024 1{}:00", i);
            row(&[
                ("Order No.", order.as_str()),
                ("Resource", "M1"),
                ("Start Time", start.as_str()),
                ("End Time", end.as_str()),
            ])
        })
        .collect();

    let report = reconcile_rows(&rows, None).unwrap();
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.dropped, 1);
    let orders: Vec<&str> = report.tasks.iter().map(|t| t.order_no.as_str()).collect();
    assert_eq!(orders, vec!["ORD1", "ORD2", "ORD4", "ORD5"]);
}

#[test]
fn test_unparseable_dates_and_blank_values_are_dropped() {
    let rows = vec![
        row(&[("ID", "A"), ("Maszyna", "M1"), ("Start", "yesterday"), ("End", "2024-02-12 10:00")]),
        row(&[("ID", ""), ("Maszyna", "M1"), ("Start", "2024-02-12 08:00"), ("End", "2024-02-12 10:00")]),
        row(&[("ID", "C"), ("Maszyna", "M1"), ("Start", "2024-02-12 08:00"), ("End", "2024-02-12 10:00")]),
    ];
    let tasks = reconcile(&rows, None).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].order_no, "C");
    assert_eq!(tasks[0].id, "C-2");
}

#[test]
fn test_resource_group_column_wins() {
    let rows = vec![row(&[
        ("Order", "W1"),
        ("Resource", "Lathe 3"),
        ("Resource Group", "Lathes"),
        ("Start", "2024-02-12T08:00"),
        ("End", "2024-02-12T09:00"),
    ])];
    let tasks = reconcile(&rows, None).unwrap();
    assert_eq!(tasks[0].resource, "Lathes");
}

#[test]
fn test_incomplete_mapping_refused_up_front() {
    let rows = vec![row(&[("Zlecenie", "Z1"), ("Gniazdo", "G1")])];
    let mapping = ColumnMapping::new()
        .with(CanonicalField::OrderNo, "Zlecenie")
        .with(CanonicalField::Resource, "Gniazdo");

    match reconcile(&rows, Some(&mapping)) {
        Err(MappingError::MissingRequired(fields)) => {
            assert_eq!(fields, vec![CanonicalField::StartTime, CanonicalField::EndTime]);
        }
        other => panic!("expected refusal, got {:?}", other),
    }
}

#[test]
fn test_user_mapping_reads_custom_headers() {
    let mapping = ColumnMapping::from_specs(&["orderNo=Zlec", "resource=Gniazdo", "startTime=Od", "endTime=Do", "qty=Szt"])
        .unwrap();
    let rows = vec![row(&[
        ("Zlec", "Z7"),
        ("Gniazdo", "Prasa"),
        ("Od", "1707724800"),
        ("Do", "1707732000000"),
        ("Szt", "40 szt."),
    ])];
    let tasks = reconcile(&rows, Some(&mapping)).unwrap();
    assert_eq!(tasks[0].start_time, Utc.with_ymd_and_hms(2024, 2, 12, 8, 0, 0).unwrap());
    assert_eq!(tasks[0].end_time, Utc.with_ymd_and_hms(2024, 2, 12, 10, 0, 0).unwrap());
    assert_eq!(tasks[0].qty, Some(40));
    assert_eq!(tasks[0].id, "Z7-0");
}

#[test]
fn test_display_format_round_trip() {
    let original = local_datetime(2024, 11, 3, 14, 25).unwrap();
    let text = format_timestamp(original);
    assert_eq!(parse_timestamp(&text).unwrap(), original);

    let with_seconds = original + Duration::seconds(42);
    let reparsed = parse_timestamp(&format_timestamp(with_seconds)).unwrap();
    assert_eq!(reparsed, original);
}

#[test]
fn test_exact_order_beats_partial_match() {
    let tasks = vec![
        task("a", "ORD1", "M1", at(8, 0), at(9, 0)),
        task("b", "ORD10", "M1", at(9, 0), at(10, 0)),
        task("c", "ORD11", "M2", at(9, 0), at(10, 0)),
    ];

    let exact = apply_filters(&tasks, &BTreeSet::new(), "ORD1");
    assert_eq!(exact.visible.len(), 1);
    assert_eq!(exact.visible[0].id, "a");
    assert!(exact.is_route());

    let partial = apply_filters(&tasks, &BTreeSet::new(), "ord");
    assert_eq!(partial.visible.len(), 3);
    assert!(partial.connections.is_empty());
    assert!(!partial.is_route());
}

#[test]
fn test_route_follows_operation_numbers() {
    let mut tasks = Vec::new();
    for (op, resource, start) in [("20", "M2", 10), ("10", "M1", 8), ("30", "M3", 12)] {
        let mut t = task(&format!("R-{}", op), "R", resource, at(start, 0), at(start + 1, 0));
        t.op_no = Some(op.to_string());
        tasks.push(t);
    }
    tasks.push(task("other", "S", "M1", at(8, 30), at(9, 30)));

    let outcome = apply_filters(&tasks, &BTreeSet::new(), " r ");
    let ops: Vec<&str> = outcome.visible.iter().filter_map(|t| t.op_no.as_deref()).collect();
    assert_eq!(ops, vec!["10", "20", "30"]);
    assert_eq!(outcome.connections.len(), 2);
    assert_eq!(outcome.connections[0].from.id, "R-10");
    assert_eq!(outcome.connections[1].to.id, "R-30");

    let window = outcome.route_window.unwrap();
    // Span 08:00..13:00 widened by 30 minutes each side
    assert_eq!(window.start, at(7, 30));
    assert_eq!(window.end, at(13, 30));
}

#[test]
fn test_route_mixes_numbered_and_unnumbered_steps() {
    let mut tasks = Vec::new();
    for (id, op, start) in [("R-20", Some("20"), 8), ("R-10", Some("10"), 9), ("R-2", None, 12)] {
        let mut t = task(id, "R", "M1", at(start, 0), at(start, 45));
        t.op_no = op.map(str::to_string);
        tasks.push(t);
    }

    let outcome = apply_filters(&tasks, &BTreeSet::new(), "R");
    let ids: Vec<&str> = outcome.visible.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["R-10", "R-20", "R-2"]);
    assert_eq!(outcome.connections[0].from.id, "R-10");
    assert_eq!(outcome.connections[1].to.id, "R-2");
}

#[test]
fn test_resource_filter_recomputes_lanes() {
    let tasks = vec![
        task("a", "A", "M1", at(8, 0), at(10, 0)),
        task("b", "B", "M1", at(9, 0), at(11, 0)),
        task("c", "C", "M2", at(9, 0), at(11, 0)),
    ];

    let all = apply_filters(&tasks, &BTreeSet::new(), "");
    assert_eq!(all.visible.iter().map(|t| t.lane).collect::<Vec<_>>(), vec![0, 1, 0]);
    assert_eq!(all.derived_window.map(|w| (w.start, w.end)), Some((at(8, 0), at(11, 0))));

    // Hiding the first task frees lane 0 for the second
    let only_b = apply_filters(&tasks, &BTreeSet::from(["M1".to_string()]), "B");
    assert_eq!(only_b.visible.len(), 1);
    assert_eq!(only_b.visible[0].lane, 0);
}
