// Output formatting: text timeline, task details, column report, CSV export

use crate::layout::lane_counts;
use crate::models::{CanonicalField, ColumnMapping, Task};
use crate::import::header::normalize;
use crate::session::SessionView;
use crate::utils::date::{format_export, format_timestamp};
use crate::utils::fuzzy::find_near_headers;
use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RESET: &str = "\x1b[0m";

const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

// Bar colors, assigned per order number by hash
const CATEGORICAL_FG_PALETTE: &[&str] = &[
    "\x1b[34m",
    "\x1b[32m",
    "\x1b[36m",
    "\x1b[35m",
    "\x1b[33m",
    "\x1b[94m",
    "\x1b[92m",
    "\x1b[96m",
    "\x1b[95m",
    "\x1b[93m",
];

/// Column headers of the CSV export
pub const EXPORT_HEADERS: [&str; 6] = ["Order No.", "Resource", "Start Time", "End Time", "Qty.", "Duration(min)"];

const LABEL_MIN: usize = 8;
const LABEL_MAX: usize = 24;
const TRACK_MIN: usize = 10;

/// Stable color for an order number
fn get_hash_fg_color(value: &str) -> &'static str {
    if value.is_empty() {
        return ANSI_FG_BRIGHT_BLACK;
    }
    let hash = value.bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize).wrapping_mul(31));
    CATEGORICAL_FG_PALETTE[hash % CATEGORICAL_FG_PALETTE.len()]
}

pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate, with fallback to the COLUMNS environment
/// variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Pad or cut `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else if width > 1 {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    } else {
        text.chars().take(width).collect()
    }
}

/// Human duration like `2h 30m`
pub fn format_duration_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}{}m", sign, m),
        (h, 0) => format!("{}{}h", sign, h),
        (h, m) => format!("{}{}h {}m", sign, h, m),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimelineOptions {
    pub width: usize,
    pub color: bool,
}

impl TimelineOptions {
    pub fn for_terminal() -> Self {
        Self {
            width: get_terminal_width(),
            color: is_tty(),
        }
    }
}

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    color: Option<&'static str>,
}

/// Render the view as one text row per resource lane.
///
/// Bars are scaled to the view window; tasks outside it are clipped. The
/// order number is written into bars wide enough to hold it.
pub fn render_timeline(view: &SessionView, options: &TimelineOptions) -> String {
    let Some(window) = view.window.filter(|_| !view.tasks.is_empty()) else {
        return "No tasks to display.\n".to_string();
    };

    let counts = lane_counts(&view.tasks);
    let label_w = counts
        .keys()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(LABEL_MIN, LABEL_MAX);
    let track_w = options.width.saturating_sub(label_w + 3).max(TRACK_MIN);
    let span_ms = window.duration().num_milliseconds().max(1) as f64;

    let column = |ts: chrono::DateTime<chrono::Utc>| -> i64 {
        let offset = (ts - window.start).num_milliseconds() as f64;
        ((offset / span_ms) * track_w as f64).floor() as i64
    };

    let mut out = String::new();
    let header = format!(
        "{} | {} .. {}",
        fit("", label_w),
        format_timestamp(window.start),
        format_timestamp(window.end)
    );
    out.push_str(&bold_if_tty(&header, options.color));
    out.push('\n');
    out.push_str(&format!("{}-+{}+\n", "-".repeat(label_w), "-".repeat(track_w)));

    for (resource, lanes) in &counts {
        for lane in 0..*lanes {
            let mut cells = vec![Cell { ch: ' ', color: None }; track_w];

            for task in view.tasks.iter().filter(|t| &t.resource == resource && t.lane == lane) {
                let start = column(task.start_time).max(0);
                let end = column(task.end_time).min(track_w as i64);
                if start >= track_w as i64 || end < 0 {
                    continue;
                }
                let start = start as usize;
                let end = (end as usize).max(start + 1).min(track_w);

                let color = options.color.then(|| get_hash_fg_color(&task.order_no));
                let fill = if options.color { '█' } else { '#' };
                for cell in &mut cells[start..end] {
                    *cell = Cell { ch: fill, color };
                }

                let label: Vec<char> = task.order_no.chars().collect();
                if end - start >= label.len() + 2 {
                    for (offset, ch) in label.into_iter().enumerate() {
                        cells[start + 1 + offset] = Cell { ch, color: color.map(|_| ANSI_BOLD) };
                    }
                }
            }

            let name = if lane == 0 { resource.as_str() } else { "" };
            out.push_str(&fit(name, label_w));
            out.push_str(" |");
            out.push_str(&paint(&cells));
            out.push_str("|\n");
        }
    }

    if view.route_active {
        if let Some(first) = view.tasks.first() {
            out.push('\n');
            out.push_str(&bold_if_tty(&format!("Route {}", first.order_no), options.color));
            out.push('\n');
        }
        if view.connections.is_empty() {
            out.push_str("  (single operation)\n");
        }
        for connection in &view.connections {
            out.push_str(&format!(
                "  {} ({}) -> {} ({})\n",
                connection.from.id, connection.from.resource, connection.to.id, connection.to.resource
            ));
        }
    }

    out
}

fn paint(cells: &[Cell]) -> String {
    let mut line = String::new();
    let mut current: Option<&'static str> = None;
    for cell in cells {
        if cell.color != current {
            if current.is_some() {
                line.push_str(ANSI_RESET);
            }
            if let Some(code) = cell.color {
                line.push_str(code);
            }
            current = cell.color;
        }
        line.push(cell.ch);
    }
    if current.is_some() {
        line.push_str(ANSI_RESET);
    }
    line
}

/// Details block for one task
pub fn format_task_details(task: &Task, color: bool) -> String {
    let mut output = String::new();

    let header = format!("Task {}", task.id);
    output.push_str(&bold_if_tty(&header, color));
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(40)));
    output.push_str("\n\n");

    let mut field = |name: &str, value: &str| {
        output.push_str(&format!("  {:<13}{}\n", format!("{}:", name), value));
    };

    field("Order No.", &task.order_no);
    field("Resource", &task.resource);
    field("Start", &format_timestamp(task.start_time));
    field("End", &format_timestamp(task.end_time));
    field("Duration", &format_duration_minutes(task.duration_minutes()));
    if let Some(qty) = task.qty {
        field("Qty.", &qty.to_string());
    }
    if let Some(op) = &task.op_no {
        field("Op. No.", op);
    }
    if let Some(product) = &task.product {
        field("Product", product);
    }
    if let Some(part) = &task.part_no {
        field("Part No.", part);
    }

    output
}

/// One resource per line with its task count
pub fn format_resources(resources: &[&str], tasks: &[Task]) -> String {
    if resources.is_empty() {
        return "No resources.\n".to_string();
    }
    let width = resources.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut output = String::new();
    for resource in resources {
        let count = tasks.iter().filter(|t| t.resource == *resource).count();
        let noun = if count == 1 { "task" } else { "tasks" };
        output.push_str(&format!("{}  {} {}\n", fit(resource, width), count, noun));
    }
    output
}

/// Headers with the field each one normalizes to, followed by the mapping
/// that would be used and suggestions for any required field left unmapped
pub fn format_columns(headers: &[String], mapping: &ColumnMapping, color: bool) -> String {
    let mut output = String::new();
    let width = headers.iter().map(|h| h.chars().count()).max().unwrap_or(0).max(6);

    output.push_str(&bold_if_tty(&format!("{}  Field", fit("Header", width)), color));
    output.push('\n');
    for header in headers {
        let tag = normalize(header).map(|f| f.name()).unwrap_or("-");
        output.push_str(&format!("{}  {}\n", fit(header, width), tag));
    }

    output.push('\n');
    output.push_str(&bold_if_tty("Mapping", color));
    output.push('\n');
    for field in CanonicalField::ALL {
        let marker = if field.is_required() { "*" } else { " " };
        match mapping.get(field) {
            Some(header) => output.push_str(&format!("  {}{:<10} <- {}\n", marker, field.name(), header)),
            None if color => output.push_str(&format!(
                "  {}{:<10} {}(unmapped){}\n",
                marker,
                field.name(),
                ANSI_DIM,
                ANSI_RESET
            )),
            None => output.push_str(&format!("  {}{:<10} (unmapped)\n", marker, field.name())),
        }
    }

    for field in mapping.missing_required() {
        let near = find_near_headers(field.name(), headers, 3);
        if near.is_empty() {
            output.push_str(&format!("Missing {}; pass --map {}=<header>\n", field.name(), field.tag()));
        } else {
            let names: Vec<String> = near.into_iter().map(|(h, _)| format!("'{}'", h)).collect();
            output.push_str(&format!("Missing {}; did you mean {}?\n", field.name(), names.join(", ")));
        }
    }

    output
}

/// Write visible tasks as CSV in display order
pub fn write_export<W: Write>(tasks: &[Task], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADERS)?;
    for task in tasks {
        csv_writer.write_record([
            task.order_no.clone(),
            task.resource.clone(),
            format_export(task.start_time),
            format_export(task.end_time),
            task.qty.map(|q| q.to_string()).unwrap_or_default(),
            task.duration_minutes().to_string(),
        ])?;
    }
    csv_writer.flush().context("Failed to write CSV export")?;
    Ok(())
}

pub fn format_view_json(view: &SessionView) -> Result<String> {
    serde_json::to_string_pretty(view).context("Failed to serialize view")
}
