use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{
    ColNum, Color, Format, FormatAlign, FormatUnderline, RowNum, Workbook, Worksheet,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::model::{SheetRecord, Status};

pub const ALERT_SHEET: &str = "ALERTA DE DESCARGA";
pub const SUMMARY_SHEET: &str = "RESUMO";

pub const HEADERS: [&str; 7] = [
    "Equipment",
    "Range",
    "Daily Total",
    "Last Discharge Value",
    "Last Functioning",
    "Status",
    "Alert",
];

const STATUS_COL: usize = 5;
const WIDTH_PADDING: usize = 2;
/// Every summary column after A, through XFD.
const HIDDEN_COLS: (ColNum, ColNum) = (1, 16_383);

pub const FLOW_ALERT_TITLE: &str = "Alerta de fluxo";
pub const NOT_DISCHARGED_TITLE: &str = "Sem descarregar";
pub const NO_ALERTS: &str = "no alerts";
pub const ALL_DISCHARGED: &str = "all discharged correctly";
const ALERT_MARK: &str = "Atenção";

const LIGHT_RED: u32 = 0xFFC7CE;
const DARK_RED: u32 = 0x9C0006;
const LIGHT_GREEN: u32 = 0xC6EFCE;
const DARK_GREEN: u32 = 0x006100;
const YELLOW: u32 = 0xFFFF00;

struct ReportFormats {
    cell: Format,
    discharged: Format,
    not_discharged: Format,
    title: Format,
    line: Format,
}

impl ReportFormats {
    fn new() -> Self {
        let cell = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let red = cell
            .clone()
            .set_background_color(Color::RGB(LIGHT_RED))
            .set_font_color(Color::RGB(DARK_RED));
        Self {
            discharged: cell
                .clone()
                .set_background_color(Color::RGB(LIGHT_GREEN))
                .set_font_color(Color::RGB(DARK_GREEN)),
            not_discharged: red,
            cell,
            title: Format::new()
                .set_bold()
                .set_underline(FormatUnderline::Single)
                .set_font_size(14)
                .set_background_color(Color::RGB(YELLOW)),
            line: Format::new().set_align(FormatAlign::Left),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellStyle {
    Plain,
    Green,
    Red,
}

/// "discharged" and "did not discharge" color the status cell only;
/// "no discharges this month" colors the whole row.
fn cell_style(status: Status, col: usize) -> CellStyle {
    match status {
        Status::NoDischargesThisMonth => CellStyle::Red,
        Status::DidNotDischarge if col == STATUS_COL => CellStyle::Red,
        Status::Discharged if col == STATUS_COL => CellStyle::Green,
        _ => CellStyle::Plain,
    }
}

enum Value {
    Text(String),
    Number(f64),
    Empty,
}

impl Value {
    fn rendered(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Value::Number(n) => n.to_string(),
            Value::Empty => String::new(),
        }
    }
}

fn row_values(record: &SheetRecord) -> [Value; 7] {
    [
        Value::Text(record.equipment.clone()),
        Value::Text(record.range_label.clone()),
        Value::Number(record.daily_total as f64),
        record
            .last_discharge_value
            .map_or(Value::Empty, Value::Number),
        Value::Text(record.formatted_datetime()),
        Value::Text(record.status.to_string()),
        Value::Text(if record.alert { ALERT_MARK } else { "" }.to_string()),
    ]
}

#[derive(Debug, PartialEq, Eq)]
enum SummaryLine {
    Title(&'static str),
    Item(String),
    Blank,
}

fn summary_lines(records: &[SheetRecord]) -> Vec<SummaryLine> {
    let mut lines = vec![SummaryLine::Title(FLOW_ALERT_TITLE)];
    let alerts: Vec<_> = records
        .iter()
        .filter(|r| r.alert)
        .map(|r| {
            SummaryLine::Item(format!(
                "{} / {} - Está com {} de fluxo",
                r.equipment, r.range_label, r.daily_total
            ))
        })
        .collect();
    if alerts.is_empty() {
        lines.push(SummaryLine::Item(NO_ALERTS.to_string()));
    } else {
        lines.extend(alerts);
    }

    lines.push(SummaryLine::Blank);
    lines.push(SummaryLine::Title(NOT_DISCHARGED_TITLE));
    let pending: Vec<_> = records
        .iter()
        .filter(|r| r.status != Status::Discharged)
        .map(|r| {
            let text = if r.status == Status::NoDischargesThisMonth {
                format!("{} / {} - Sem descargas no mês", r.equipment, r.range_label)
            } else {
                format!(
                    "{} / {} - Último funcionamento: {}",
                    r.equipment,
                    r.range_label,
                    r.formatted_datetime()
                )
            };
            SummaryLine::Item(text)
        })
        .collect();
    if pending.is_empty() {
        lines.push(SummaryLine::Item(ALL_DISCHARGED.to_string()));
    } else {
        lines.extend(pending);
    }
    lines
}

/// Longest rendered value per column, header included, plus padding.
fn column_widths(records: &[SheetRecord]) -> [usize; 7] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for record in records {
        for (col, value) in row_values(record).iter().enumerate() {
            widths[col] = widths[col].max(value.rendered().chars().count());
        }
    }
    widths.map(|w| w + WIDTH_PADDING)
}

/// Last row and column of the alert table, which the autofilter spans from A1.
fn table_end(records: &[SheetRecord]) -> (RowNum, ColNum) {
    (records.len() as RowNum, (HEADERS.len() - 1) as ColNum)
}

fn summary_width(lines: &[SummaryLine]) -> usize {
    lines
        .iter()
        .map(|line| match line {
            SummaryLine::Title(text) => text.chars().count(),
            SummaryLine::Item(text) => text.chars().count(),
            SummaryLine::Blank => 0,
        })
        .max()
        .unwrap_or(0)
        + WIDTH_PADDING
}

fn write_alert_sheet(
    ws: &mut Worksheet,
    records: &[SheetRecord],
    fmt: &ReportFormats,
) -> Result<()> {
    for (i, h) in HEADERS.iter().enumerate() {
        ws.write_string_with_format(0, i as ColNum, *h, &fmt.cell)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as RowNum + 1;
        for (col, value) in row_values(record).iter().enumerate() {
            let cell_fmt = match cell_style(record.status, col) {
                CellStyle::Plain => &fmt.cell,
                CellStyle::Green => &fmt.discharged,
                CellStyle::Red => &fmt.not_discharged,
            };
            let c = col as ColNum;
            match value {
                Value::Text(s) if !s.is_empty() => {
                    ws.write_string_with_format(row, c, s, cell_fmt)?;
                }
                Value::Number(n) => {
                    ws.write_number_with_format(row, c, *n, cell_fmt)?;
                }
                _ => {
                    ws.write_blank(row, c, cell_fmt)?;
                }
            }
        }
    }

    let (last_row, last_col) = table_end(records);
    ws.autofilter(0, 0, last_row, last_col)?;
    for (col, width) in column_widths(records).iter().enumerate() {
        ws.set_column_width(col as ColNum, *width as f64)?;
    }
    Ok(())
}

fn write_summary_sheet(
    ws: &mut Worksheet,
    lines: &[SummaryLine],
    fmt: &ReportFormats,
) -> Result<()> {
    for (row, line) in lines.iter().enumerate() {
        let row = row as RowNum;
        match line {
            SummaryLine::Title(text) => {
                ws.write_string_with_format(row, 0, *text, &fmt.title)?;
            }
            SummaryLine::Item(text) => {
                ws.write_string_with_format(row, 0, text, &fmt.line)?;
            }
            SummaryLine::Blank => {}
        }
    }
    ws.set_column_width(0, summary_width(lines) as f64)?;
    ws.set_column_range_hidden(HIDDEN_COLS.0, HIDDEN_COLS.1)?;
    Ok(())
}

/// `<input stem>_<YYYY-MM-DD_HH-MM>.xlsx`; same input and minute yields the same name.
pub fn output_file_name(input: &Path, now: NaiveDateTime) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "relatorio".to_string());
    format!("{}_{}.xlsx", stem, now.format("%Y-%m-%d_%H-%M"))
}

/// Builds both sheets in memory and writes the finished file in one step.
pub fn generate_report(
    records: &[SheetRecord],
    input: &Path,
    now: NaiveDateTime,
    output_dir: &Path,
) -> Result<PathBuf> {
    let output_path = output_dir.join(output_file_name(input, now));
    let fmt = ReportFormats::new();

    let mut workbook = Workbook::new();
    write_alert_sheet(workbook.add_worksheet().set_name(ALERT_SHEET)?, records, &fmt)?;
    let lines = summary_lines(records);
    debug!(lines = lines.len(), "summary built");
    write_summary_sheet(workbook.add_worksheet().set_name(SUMMARY_SHEET)?, &lines, &fmt)?;

    let buffer = workbook
        .save_to_buffer()
        .context("Failed to assemble report workbook")?;
    persist(&buffer, &output_path)?;
    info!(path = %output_path.display(), records = records.len(), "report saved");
    Ok(output_path)
}

fn persist(buffer: &[u8], path: &Path) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    let written = fs::write(&partial, buffer).and_then(|_| fs::rename(&partial, path));
    if written.is_err() {
        let _ = fs::remove_file(&partial);
    }
    written.with_context(|| format!("Failed to write report: {}", path.display()))
}
