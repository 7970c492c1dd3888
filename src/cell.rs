use calamine::{Data, DataType};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ExtractError;

/// Zero-based column index for a column letter ("A" -> 0, "AA" -> 26).
pub fn letter_to_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        index = index.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)?;
    }
    Some(index - 1)
}

pub fn index_to_letter(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style reference, stored zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = letter_to_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { row: row - 1, col })
    }

    pub fn pos(&self) -> (u32, u32) {
        (self.row, self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", index_to_letter(self.col), self.row + 1)
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CellRef::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid cell reference: {s}")))
    }
}

/// Renders a cell the way a user reads it; integral floats lose their ".0".
pub fn cell_text(cell: Option<&Data>) -> String {
    cell.map(|c| match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => c
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    })
    .unwrap_or_default()
}

pub fn is_blank(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Integer coercion: numbers truncate, numeric text parses, blanks are `None`.
pub fn cell_int(cell: Option<&Data>, at: CellRef) -> Result<Option<i64>, ExtractError> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        Some(Data::Int(i)) => Ok(Some(*i)),
        Some(Data::Float(f)) => Ok(Some(*f as i64)),
        Some(Data::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ExtractError::TypeMismatch {
                cell: at,
                found: s.clone(),
            }),
        other => Err(ExtractError::TypeMismatch {
            cell: at,
            found: cell_text(other),
        }),
    }
}

/// Numeric value of a scanned cell; blanks are `None`, text is a mismatch.
pub fn cell_number(cell: Option<&Data>, at: CellRef) -> Result<Option<f64>, ExtractError> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell {
        Some(Data::Int(i)) => Ok(Some(*i as f64)),
        Some(Data::Float(f)) if f.is_nan() => Ok(None),
        Some(Data::Float(f)) => Ok(Some(*f)),
        other => Err(ExtractError::TypeMismatch {
            cell: at,
            found: cell_text(other),
        }),
    }
}
