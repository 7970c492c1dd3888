//! Fixed positions of the monthly discharge report.
//!
//! Every coordinate the extractor reads lives here. Rows in the TOML form are
//! 1-based, exactly as shown in a spreadsheet.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::cell::CellRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    /// Only sheets whose name starts with this are read.
    pub sheet_prefix: String,
    pub equipment_cell: CellRef,
    /// Character range taken from the equipment cell text.
    pub equipment_start: usize,
    pub equipment_end: usize,
    pub range_cell: CellRef,
    pub total_row: u32,
    pub scan_first_row: u32,
    pub scan_last_row: u32,
    pub timestamp_column: String,
    pub alert_threshold: i64,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            sheet_prefix: "Page".to_string(),
            equipment_cell: CellRef { row: 8, col: 13 },
            equipment_start: 5,
            equipment_end: 9,
            range_cell: CellRef { row: 9, col: 13 },
            total_row: 40,
            scan_first_row: 16,
            scan_last_row: 39,
            timestamp_column: "B".to_string(),
            alert_threshold: 600,
        }
    }
}

impl Template {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        let template: Template = toml::from_str(&text)
            .with_context(|| format!("Invalid template: {}", path.display()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.total_row >= 1, "total_row is 1-based");
        ensure!(
            self.scan_first_row >= 1 && self.scan_first_row <= self.scan_last_row,
            "scan rows must satisfy 1 <= scan_first_row <= scan_last_row"
        );
        ensure!(
            self.equipment_start <= self.equipment_end,
            "equipment_start must not exceed equipment_end"
        );
        ensure!(
            crate::cell::letter_to_index(&self.timestamp_column).is_some(),
            "timestamp_column must be a column letter"
        );
        Ok(())
    }

    pub fn total_row_index(&self) -> u32 {
        self.total_row - 1
    }

    /// Zero-based scanned rows, top to bottom.
    pub fn scan_rows(&self) -> std::ops::RangeInclusive<u32> {
        (self.scan_first_row - 1)..=(self.scan_last_row - 1)
    }

    pub fn timestamp_col_index(&self) -> u32 {
        crate::cell::letter_to_index(&self.timestamp_column).unwrap_or(1)
    }
}
