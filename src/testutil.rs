use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{ColNum, Workbook};
use std::path::Path;

use crate::model::DayColumnMap;

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// One reading in a day column; `row` is 1-based as in the spreadsheet.
pub struct Reading {
    pub day: u32,
    pub row: u32,
    pub value: f64,
    pub stamp: Option<&'static str>,
}

pub struct SheetFixture {
    pub name: &'static str,
    pub equipment: &'static str,
    pub range: &'static str,
    pub total: Option<(u32, f64)>,
    pub readings: Vec<Reading>,
    pub text_cells: Vec<(u32, u32, &'static str)>,
    pub full_size: bool,
}

impl SheetFixture {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            equipment: "EQP: BX12 - bomba",
            range: "0-1000",
            total: None,
            readings: Vec::new(),
            text_cells: Vec::new(),
            full_size: true,
        }
    }

    pub fn total(mut self, day: u32, value: f64) -> Self {
        self.total = Some((day, value));
        self
    }

    pub fn reading(mut self, day: u32, row: u32, value: f64, stamp: Option<&'static str>) -> Self {
        self.readings.push(Reading {
            day,
            row,
            value,
            stamp,
        });
        self
    }

    pub fn equipment(mut self, text: &'static str) -> Self {
        self.equipment = text;
        self
    }

    /// Raw text at a zero-based position.
    pub fn text(mut self, row: u32, col: u32, text: &'static str) -> Self {
        self.text_cells.push((row, col, text));
        self
    }

    pub fn truncated(mut self) -> Self {
        self.full_size = false;
        self
    }
}

/// Sheet column indices are `u32`; the writer addresses columns as `ColNum`.
pub fn col_num(col: u32) -> ColNum {
    ColNum::try_from(col).unwrap()
}

pub fn write_workbook(path: &Path, sheets: &[SheetFixture]) {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let ws = workbook.add_worksheet().set_name(sheet.name).unwrap();
        ws.write_string(8, 13, sheet.equipment).unwrap();
        ws.write_string(9, 13, sheet.range).unwrap();
        if let Some((day, value)) = sheet.total {
            let col = DayColumnMap::column(day).unwrap();
            ws.write_number(39, col_num(col), value).unwrap();
        }
        for r in &sheet.readings {
            let col = DayColumnMap::column(r.day).unwrap();
            ws.write_number(r.row - 1, col_num(col), r.value).unwrap();
            if let Some(stamp) = r.stamp {
                ws.write_string(r.row - 1, 1, stamp).unwrap();
            }
        }
        for (row, col, text) in &sheet.text_cells {
            ws.write_string(*row, col_num(*col), *text).unwrap();
        }
        if sheet.full_size {
            ws.write_string(0, col_num(DayColumnMap::max_column()), "fim").unwrap();
            ws.write_string(39, 0, "Total").unwrap();
        }
    }
    workbook.save(path).unwrap();
}

#[test]
fn fixture_writes_last_day_column_where_it_is_read() {
    use calamine::{Data, Reader, Xlsx, open_workbook};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.xlsx");
    write_workbook(
        &path,
        &[SheetFixture::new("Page 1").reading(31, 20, 9.0, Some("07:45"))],
    );
    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Page 1").unwrap();
    let bd = DayColumnMap::column(31).unwrap();
    assert_eq!(range.get_value((19, bd)), Some(&Data::Float(9.0)));
    assert_eq!(range.get_value((0, bd)), Some(&Data::String("fim".into())));
    assert_eq!(col_num(bd), 55);
}
