//! Bulk row parsing
//!
//! Turns the bytes of an uploaded file into a lazy sequence of candidate
//! `(name, phone)` rows. No uniqueness checks happen here; malformed rows are
//! dropped instead of failing the whole upload. Parsing the same bytes again
//! restarts the sequence.

mod delimited;
mod spreadsheet;

pub use delimited::DelimitedRows;
pub use spreadsheet::{ColumnSchema, SheetRows};

use std::path::Path;

use crate::{ContactRow, Result};

/// Declared format of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// One contact per line, `name,phone` or `name-phone`
    Delimited,
    /// First worksheet of an xlsx/xls/ods workbook with name and phone columns
    Spreadsheet,
}

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

const SPREADSHEET_CONTENT_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.oasis.opendocument.spreadsheet",
];

impl ImportFormat {
    /// Pick a format from the upload's file name and content type
    ///
    /// Anything not recognizably a spreadsheet is treated as delimited text.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Self {
        let by_extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SPREADSHEET_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        let by_content_type = content_type
            .map(|mime| {
                SPREADSHEET_CONTENT_TYPES
                    .iter()
                    .any(|known| mime.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if by_extension || by_content_type {
            ImportFormat::Spreadsheet
        } else {
            ImportFormat::Delimited
        }
    }
}

/// Candidate rows from either format
pub enum ContactRows<'a> {
    Delimited(DelimitedRows<'a>),
    Spreadsheet(SheetRows),
}

impl Iterator for ContactRows<'_> {
    type Item = ContactRow;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ContactRows::Delimited(rows) => rows.next(),
            ContactRows::Spreadsheet(rows) => rows.next(),
        }
    }
}

/// Parse `bytes` using the default spreadsheet column schema
pub fn parse_rows(bytes: &[u8], format: ImportFormat) -> Result<ContactRows<'_>> {
    parse_rows_with_schema(bytes, format, &ColumnSchema::default())
}

/// Parse `bytes`, locating spreadsheet columns with `schema`
///
/// Fails with `BadInput` only when the file as a whole cannot be read
/// (non-UTF-8 text, unreadable workbook, missing columns).
pub fn parse_rows_with_schema<'a>(
    bytes: &'a [u8],
    format: ImportFormat,
    schema: &ColumnSchema,
) -> Result<ContactRows<'a>> {
    match format {
        ImportFormat::Delimited => Ok(ContactRows::Delimited(DelimitedRows::from_bytes(bytes)?)),
        ImportFormat::Spreadsheet => Ok(ContactRows::Spreadsheet(SheetRows::from_bytes(
            bytes, schema,
        )?)),
    }
}
