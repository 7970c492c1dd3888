use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::{fmt, sync::LazyLock};

use crate::cell::letter_to_index;

/// Column holding each day's readings, indexed by day-of-month minus one.
pub const DAY_COLUMNS: [&str; 31] = [
    "H", "K", "L", "P", "R", "S", "T", "V", "X", "Z", "AA", "AB", "AC", "AE", "AF", "AI", "AK",
    "AM", "AN", "AO", "AP", "AQ", "AR", "AT", "AU", "AV", "AW", "AX", "BA", "BC", "BD",
];

static DAY_COLUMN_INDICES: LazyLock<[u32; 31]> = LazyLock::new(|| {
    DAY_COLUMNS.map(|letters| letter_to_index(letters).unwrap_or_default())
});

pub const LAST_DAY: u32 = 31;

pub struct DayColumnMap;

impl DayColumnMap {
    pub fn column(day: u32) -> Option<u32> {
        (1..=LAST_DAY)
            .contains(&day)
            .then(|| DAY_COLUMN_INDICES[day as usize - 1])
    }

    /// `(day, column)` pairs from day 31 down to day 1.
    pub fn days_descending() -> impl Iterator<Item = (u32, u32)> {
        (1..=LAST_DAY)
            .rev()
            .map(|day| (day, DAY_COLUMN_INDICES[day as usize - 1]))
    }

    pub fn max_column() -> u32 {
        DAY_COLUMN_INDICES.iter().copied().max().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoDischargesThisMonth,
    DidNotDischarge,
    Discharged,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NoDischargesThisMonth => "no discharges this month",
            Status::DidNotDischarge => "did not discharge",
            Status::Discharged => "discharged",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock reading and hour threshold for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub now: NaiveDateTime,
    pub reference_hour: u32,
}

impl RunContext {
    pub fn new(now: NaiveDateTime, reference_hour: Option<u32>) -> Self {
        Self {
            now,
            reference_hour: reference_hour.unwrap_or_else(|| now.hour()),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn today_day(&self) -> u32 {
        self.now.day().min(LAST_DAY)
    }
}

pub const DATETIME_FORMAT: &str = "%d/%m/%y %H:%M";

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecord {
    pub equipment: String,
    pub range_label: String,
    pub daily_total: i64,
    pub last_discharge_value: Option<f64>,
    pub last_discharge_day: Option<u32>,
    pub last_discharge_time: String,
    pub last_discharge_datetime: Option<NaiveDateTime>,
    pub status: Status,
    pub alert: bool,
}

impl SheetRecord {
    pub fn formatted_datetime(&self) -> String {
        self.last_discharge_datetime
            .map(|dt| dt.format(DATETIME_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum SheetOutcome {
    Record(SheetRecord),
    Skipped { sheet: String, reason: String },
}
