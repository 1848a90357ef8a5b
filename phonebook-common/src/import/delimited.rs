//! Line-oriented text uploads

use std::str::Lines;

use crate::contact::is_blank;
use crate::{ContactRow, Error, Result};

const BOM: &str = "\u{feff}";

/// Rows of a text upload, one candidate per line
///
/// A line is split on `,` when it has one, otherwise on `-`. The first two
/// fields become name and phone after trimming. Blank lines and lines without
/// two non-blank fields are skipped.
pub struct DelimitedRows<'a> {
    lines: Lines<'a>,
}

impl<'a> DelimitedRows<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.strip_prefix(BOM).unwrap_or(text).lines(),
        }
    }

    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::BadInput(format!("Upload is not valid UTF-8 text: {}", e)))?;

        Ok(Self::new(text))
    }
}

impl Iterator for DelimitedRows<'_> {
    type Item = ContactRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(parse_line)
    }
}

fn parse_line(line: &str) -> Option<ContactRow> {
    if is_blank(line) {
        return None;
    }

    let delimiter = if line.contains(',') { ',' } else { '-' };
    let mut fields = line.split(delimiter);

    let name = fields.next()?.trim();
    let phone = fields.next()?.trim();

    let row = ContactRow::new(name, phone);
    row.is_complete().then_some(row)
}
