//! Spreadsheet uploads (xlsx, xls, ods)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::contact::is_blank;
use crate::{ContactRow, Error, Result};

/// Header names identifying the name and phone columns
///
/// Headers are matched case-insensitively against the first row of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name_header: String,
    pub phone_header: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            name_header: "name".to_string(),
            phone_header: "phone".to_string(),
        }
    }
}

impl ColumnSchema {
    /// Column indices of (name, phone) within a header row
    pub fn locate(&self, header: &[Data]) -> Result<(usize, usize)> {
        let find = |wanted: &str| {
            header
                .iter()
                .position(|cell| cell.to_string().trim().eq_ignore_ascii_case(wanted))
        };

        let name = find(&self.name_header).ok_or_else(|| {
            Error::BadInput(format!("Spreadsheet has no '{}' column", self.name_header))
        })?;
        let phone = find(&self.phone_header).ok_or_else(|| {
            Error::BadInput(format!("Spreadsheet has no '{}' column", self.phone_header))
        })?;

        Ok((name, phone))
    }
}

/// Data rows of the first worksheet, mapped through a [`ColumnSchema`]
pub struct SheetRows {
    range: Range<Data>,
    name_col: usize,
    phone_col: usize,
    next_row: usize,
}

impl SheetRows {
    pub fn from_bytes(bytes: &[u8], schema: &ColumnSchema) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| Error::BadInput(format!("Unreadable spreadsheet: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::BadInput("Spreadsheet has no worksheets".to_string()))?
            .map_err(|e| Error::BadInput(format!("Unreadable worksheet: {}", e)))?;

        Self::from_range(range, schema)
    }

    /// Build from an already loaded sheet whose first row is the header
    pub fn from_range(range: Range<Data>, schema: &ColumnSchema) -> Result<Self> {
        let header = range
            .rows()
            .next()
            .ok_or_else(|| Error::BadInput("Spreadsheet is empty".to_string()))?;

        let (name_col, phone_col) = schema.locate(header)?;
        debug!(name_col, phone_col, rows = range.height(), "Located spreadsheet columns");

        Ok(Self {
            range,
            name_col,
            phone_col,
            next_row: 1,
        })
    }

    fn cell(&self, row: usize, col: usize) -> String {
        self.range
            .get((row, col))
            .map(|cell| cell.to_string().trim().to_string())
            .unwrap_or_default()
    }
}

impl Iterator for SheetRows {
    type Item = ContactRow;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_row < self.range.height() {
            let row = self.next_row;
            self.next_row += 1;

            let name = self.cell(row, self.name_col);
            let phone = self.cell(row, self.phone_col);
            if is_blank(&name) || is_blank(&phone) {
                continue;
            }

            return Some(ContactRow::new(name, phone));
        }

        None
    }
}
