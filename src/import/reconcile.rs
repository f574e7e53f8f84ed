//! Column reconciler
//!
//! Turns decoded rows into validated tasks using a confirmed or detected
//! column mapping. Messy input is the steady state: rows missing a required
//! value or carrying an unparseable date are dropped and logged, never
//! reported as errors. Only an incomplete confirmed mapping refuses the
//! whole batch.

use crate::import::header::detect_mapping;
use crate::models::{CanonicalField, ColumnMapping, MappingError, Record, Task};
use crate::utils::date::parse_timestamp;
use crate::utils::number::parse_leading_int;

/// Outcome of reconciling one batch of rows
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub tasks: Vec<Task>,
    pub total_rows: usize,
    pub dropped: usize,
    /// The mapping that was applied (detected when none was supplied)
    pub mapping: ColumnMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    MissingOrderOrResource,
    MissingDates,
    UnparseableDate,
}

/// Reconcile rows into tasks, preserving row order.
///
/// A supplied mapping must name every required field. Without one, the
/// mapping is detected from the headers of the first row.
pub fn reconcile(rows: &[Record], mapping: Option<&ColumnMapping>) -> Result<Vec<Task>, MappingError> {
    reconcile_rows(rows, mapping).map(|report| report.tasks)
}

/// Same as [`reconcile`], also reporting how many rows were dropped
pub fn reconcile_rows(rows: &[Record], mapping: Option<&ColumnMapping>) -> Result<ReconcileReport, MappingError> {
    let mapping = match mapping {
        Some(mapping) => {
            mapping.validate()?;
            mapping.clone()
        }
        None => {
            let detected = rows
                .first()
                .map(|row| detect_mapping(row.keys().map(String::as_str)))
                .unwrap_or_default();
            log::debug!("detected column mapping: {:?}", detected);
            detected
        }
    };

    let mut tasks = Vec::with_capacity(rows.len());
    let mut dropped = 0;

    for (index, row) in rows.iter().enumerate() {
        match reconcile_row(row, index, &mapping) {
            Ok(task) => tasks.push(task),
            Err(reason) => {
                dropped += 1;
                log::debug!("dropping row {}: {:?} (columns: {:?})", index + 1, reason, row.keys().collect::<Vec<_>>());
            }
        }
    }

    log::info!("reconciled {} tasks from {} rows ({} dropped)", tasks.len(), rows.len(), dropped);

    Ok(ReconcileReport {
        tasks,
        total_rows: rows.len(),
        dropped,
        mapping,
    })
}

fn reconcile_row(row: &Record, index: usize, mapping: &ColumnMapping) -> Result<Task, DropReason> {
    let order_no = field_value(row, mapping, CanonicalField::OrderNo);
    let resource = field_value(row, mapping, CanonicalField::Resource);
    let (Some(order_no), Some(resource)) = (order_no, resource) else {
        return Err(DropReason::MissingOrderOrResource);
    };

    let start_raw = field_value(row, mapping, CanonicalField::StartTime);
    let end_raw = field_value(row, mapping, CanonicalField::EndTime);
    let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) else {
        return Err(DropReason::MissingDates);
    };

    let start_time = parse_timestamp(&start_raw).map_err(|_| DropReason::UnparseableDate)?;
    let end_time = parse_timestamp(&end_raw).map_err(|_| DropReason::UnparseableDate)?;

    let op_no = field_value(row, mapping, CanonicalField::OpNo);
    let mut task = Task::new(
        Task::derive_id(&order_no, op_no.as_deref(), index),
        order_no,
        resource,
        start_time,
        end_time,
    );
    task.qty = field_value(row, mapping, CanonicalField::Qty).and_then(|q| parse_leading_int(&q));
    task.op_no = op_no;
    task.product = field_value(row, mapping, CanonicalField::Product);
    task.part_no = field_value(row, mapping, CanonicalField::PartNo);
    Ok(task)
}

/// Mapped column first, then the legacy literal headers
fn field_value(row: &Record, mapping: &ColumnMapping, field: CanonicalField) -> Option<String> {
    mapping
        .get(field)
        .and_then(|header| row.get(header))
        .and_then(|cell| cell.as_text())
        .or_else(|| {
            field
                .legacy_headers()
                .iter()
                .find_map(|header| row.get(*header).and_then(|cell| cell.as_text()))
        })
}
