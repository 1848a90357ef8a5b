//! Delimited export
//!
//! Writes one `name,phone` line per contact so the output can be fed back
//! through the delimited bulk upload.

use crate::Contact;

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Render contacts as delimited text
///
/// Commas inside a field would split the line on re-import, so they are
/// replaced with spaces.
pub fn to_delimited<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> String {
    let mut out = String::new();

    for contact in contacts {
        out.push_str(&field(&contact.name));
        out.push(',');
        out.push_str(&field(&contact.phone));
        out.push('\n');
    }

    out
}

fn field(value: &str) -> String {
    value.replace([',', '\n', '\r'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::DelimitedRows;
    use crate::ContactRow;

    #[test]
    fn test_export_reimports() {
        let contacts = vec![
            Contact::new("Ann Lee", "555-0100").unwrap(),
            Contact::new("Smith, Bob", "555-0101").unwrap(),
        ];

        let text = to_delimited(&contacts);
        let rows: Vec<_> = DelimitedRows::new(&text).collect();

        assert_eq!(
            rows,
            vec![
                ContactRow::new("Ann Lee", "555-0100"),
                ContactRow::new("Smith  Bob", "555-0101"),
            ]
        );
    }

    #[test]
    fn test_empty_export() {
        assert_eq!(to_delimited(&Vec::<Contact>::new()), "");
    }
}
