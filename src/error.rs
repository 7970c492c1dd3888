use thiserror::Error;

use crate::cell::CellRef;

/// Reasons a single sheet is left out of the report.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read sheet: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("sheet ends at {found}, layout needs cells up to {needed}")]
    OutOfRange { needed: CellRef, found: String },

    #[error("expected a number at {cell}, found {found:?}")]
    TypeMismatch { cell: CellRef, found: String },
}
