//! Flat record serialization.
//!
//! List components persist their column definitions as a flat string:
//! records separated by `^`, fields within a record separated by `|`.
//! Occurrences of either separator (or the escape character) inside a field
//! are backslash-escaped, so any field content survives a round trip.
//!
//! # Example
//!
//! ```
//! use trellis::defs::{join_records, split_records};
//!
//! let records = vec![
//!     vec!["name".to_string(), "Name".to_string(), "120".to_string()],
//!     vec!["age".to_string(), "Age".to_string(), "40".to_string()],
//! ];
//! let flat = join_records(&records);
//! assert_eq!(flat, "name|Name|120^age|Age|40");
//! assert_eq!(split_records(&flat), records);
//! ```

const RECORD_SEP: char = '^';
const FIELD_SEP: char = '|';
const ESCAPE: char = '\\';

fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c == RECORD_SEP || c == FIELD_SEP || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}

/// Serialize records to the flat `^`/`|` format.
pub fn join_records(records: &[Vec<String>]) -> String {
    records
        .iter()
        .map(|record| {
            record
                .iter()
                .map(|field| escape_field(field))
                .collect::<Vec<_>>()
                .join(&FIELD_SEP.to_string())
        })
        .collect::<Vec<_>>()
        .join(&RECORD_SEP.to_string())
}

/// Parse the flat `^`/`|` format back into records.
///
/// The empty string parses to no records; a record with no separators
/// parses to a single field.
pub fn split_records(flat: &str) -> Vec<Vec<String>> {
    if flat.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut escaped = false;

    for c in flat.chars() {
        if escaped {
            field.push(c);
            escaped = false;
            continue;
        }
        match c {
            ESCAPE => escaped = true,
            FIELD_SEP => record.push(std::mem::take(&mut field)),
            RECORD_SEP => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            other => field.push(other),
        }
    }
    // Trailing escape character with nothing after it is kept literally.
    if escaped {
        field.push(ESCAPE);
    }
    record.push(field);
    records.push(record);
    records
}
