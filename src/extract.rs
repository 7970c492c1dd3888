use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use chrono::{Datelike, NaiveDateTime, Timelike};
use regex::Regex;
use std::{path::Path, sync::LazyLock};
use tracing::{debug, info, warn};

use crate::{
    cell::{CellRef, cell_int, cell_number, cell_text, is_blank},
    error::ExtractError,
    model::{DATETIME_FORMAT, DayColumnMap, RunContext, SheetOutcome, SheetRecord, Status},
    template::Template,
};

static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}:\d{2}\b").expect("static pattern"));

/// Latest positive reading of the month.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Discharge {
    value: f64,
    row: u32,
    day: u32,
}

/// Reads every sheet named with the template prefix, in workbook order.
pub fn extract_workbook<P: AsRef<Path>>(
    path: P,
    ctx: &RunContext,
    template: &Template,
) -> Result<Vec<SheetOutcome>> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheets: Vec<String> = workbook
        .sheet_names()
        .into_iter()
        .filter(|name| name.starts_with(&template.sheet_prefix))
        .collect();
    info!(count = sheets.len(), path = %path.display(), "reading equipment sheets");

    let outcomes = sheets
        .into_iter()
        .map(|name| {
            let result = workbook
                .worksheet_range(&name)
                .map_err(ExtractError::from)
                .and_then(|range| extract_sheet(&range, ctx, template));
            match result {
                Ok(record) => {
                    debug!(
                        sheet = %name,
                        equipment = %record.equipment,
                        day = ?record.last_discharge_day,
                        time = %record.last_discharge_time,
                        status = %record.status,
                        "sheet extracted"
                    );
                    SheetOutcome::Record(record)
                }
                Err(err) => SheetOutcome::Skipped {
                    sheet: name,
                    reason: err.to_string(),
                },
            }
        })
        .collect();
    Ok(outcomes)
}

/// Keeps the records and logs every skipped sheet.
pub fn collect_records(outcomes: Vec<SheetOutcome>) -> Vec<SheetRecord> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            SheetOutcome::Record(record) => Some(record),
            SheetOutcome::Skipped { sheet, reason } => {
                warn!(sheet = %sheet, %reason, "skipping sheet");
                None
            }
        })
        .collect()
}

pub fn extract_sheet(
    range: &Range<Data>,
    ctx: &RunContext,
    template: &Template,
) -> Result<SheetRecord, ExtractError> {
    ensure_covers(range, template)?;

    let today_col =
        DayColumnMap::column(ctx.today_day()).unwrap_or_else(DayColumnMap::max_column);

    let equipment = slice_chars(
        &cell_text(range.get_value(template.equipment_cell.pos())),
        template.equipment_start,
        template.equipment_end,
    );
    let range_label = cell_text(range.get_value(template.range_cell.pos()));

    let total_at = CellRef {
        row: template.total_row_index(),
        col: today_col,
    };
    let daily_total = cell_int(range.get_value(total_at.pos()), total_at)?.unwrap_or(0);

    let discharge = latest_discharge(range, template)?;

    let last_discharge_time = discharge
        .map(|d| time_token(range.get_value((d.row, template.timestamp_col_index()))))
        .unwrap_or_default();

    let last_discharge_datetime =
        discharge.and_then(|d| compose_datetime(d.day, &last_discharge_time, ctx.now));

    Ok(SheetRecord {
        equipment,
        range_label,
        daily_total,
        last_discharge_value: discharge.map(|d| d.value),
        last_discharge_day: discharge.map(|d| d.day),
        last_discharge_time,
        last_discharge_datetime,
        status: classify(discharge.is_some(), last_discharge_datetime, ctx),
        alert: daily_total < template.alert_threshold,
    })
}

fn ensure_covers(range: &Range<Data>, template: &Template) -> Result<(), ExtractError> {
    let needed = CellRef {
        row: template.total_row_index().max(*template.scan_rows().end()),
        col: DayColumnMap::max_column()
            .max(template.equipment_cell.col)
            .max(template.range_cell.col),
    };
    match range.end() {
        Some((row, col)) if row >= needed.row && col >= needed.col => Ok(()),
        Some((row, col)) => Err(ExtractError::OutOfRange {
            needed,
            found: CellRef { row, col }.to_string(),
        }),
        None => Err(ExtractError::OutOfRange {
            needed,
            found: "empty sheet".to_string(),
        }),
    }
}

fn slice_chars(text: &str, start: usize, end: usize) -> String {
    if text.chars().count() < end {
        return String::new();
    }
    text.chars().skip(start).take(end - start).collect()
}

/// Scans day columns from day 31 back; the first day with a positive
/// reading wins, and within it the bottom-most one.
fn latest_discharge(
    range: &Range<Data>,
    template: &Template,
) -> Result<Option<Discharge>, ExtractError> {
    for (day, col) in DayColumnMap::days_descending() {
        let mut last = None;
        for row in template.scan_rows() {
            let at = CellRef { row, col };
            if let Some(value) = cell_number(range.get_value(at.pos()), at)? {
                if value > 0.0 {
                    last = Some(Discharge { value, row, day });
                }
            }
        }
        if last.is_some() {
            return Ok(last);
        }
    }
    Ok(None)
}

fn time_token(cell: Option<&Data>) -> String {
    if is_blank(cell) {
        return String::new();
    }
    let raw = cell_text(cell);
    match TIME_TOKEN.find(&raw) {
        Some(m) => m.as_str().to_string(),
        None => raw,
    }
}

/// Day of the discharge plus the run's month and two-digit year.
fn compose_datetime(day: u32, time: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if time.is_empty() {
        return None;
    }
    let text = format!(
        "{:02}/{:02}/{:02} {}",
        day,
        now.month(),
        now.year().rem_euclid(100),
        time
    );
    NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT).ok()
}

// A discharge whose timestamp cannot be resolved counts as "did not discharge".
pub fn classify(has_discharge: bool, when: Option<NaiveDateTime>, ctx: &RunContext) -> Status {
    if !has_discharge {
        return Status::NoDischargesThisMonth;
    }
    match when {
        Some(dt) if dt.date() != ctx.today() => Status::DidNotDischarge,
        Some(dt) if dt.hour() >= ctx.reference_hour => Status::Discharged,
        _ => Status::DidNotDischarge,
    }
}
