//! Helpers shared by the CSV ranking readers.

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::io::Read;

/// Reader for the semicolon-separated exports of the ranking platforms.
///
/// The header row is read as a regular record and rows may have any length.
pub(crate) fn reader<R: Read>(input: R) -> csv::Reader<R> {
    reader_with_delimiter(input, b';')
}

pub(crate) fn reader_with_delimiter<R: Read>(input: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::Fields)
        .from_reader(input)
}

/// Rows of the table. Invalid UTF-8 sequences are replaced instead of
/// failing the whole table.
pub(crate) fn records<R: Read>(
    reader: &mut csv::Reader<R>,
) -> impl Iterator<Item = Result<StringRecord, csv::Error>> + '_ {
    reader.byte_records().map(|record| record.map(|r| decode_lossy(&r)))
}

fn decode_lossy(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Header name without byte order mark, surrounding spaces and stray quotes
pub(crate) fn header_name(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim().trim_matches('"').trim()
}

/// Index of the first column named `name`, ignoring case
pub(crate) fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header_name(header).eq_ignore_ascii_case(name))
}

/// Non-empty value of the column, if the row has one
pub(crate) fn field(record: &StringRecord, column: Option<usize>) -> Option<&str> {
    column
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
