//! Line codec for snapshot files.
//!
//! Format, one record per line:
//! ```text
//! <id>|<field 1>|<field 2>|...|<field N>
//! ```
//! No header, no escaping, no trailing metadata. Fields must not contain `|` or line
//! breaks; [`encode_line`] refuses them rather than writing a line that cannot be read back.

use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::entity::{EntityId, FlatRecord};
use crate::error::{FieldError, ParseError, ValidationError};
use crate::validation::{self, RESERVED_DELIMITER};

/// Date layout written to snapshots.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encodes one record as a snapshot line, without the line terminator.
///
/// # Errors
/// `ReservedCharacter` if any field contains the delimiter or a line break.
pub fn encode_line<T: FlatRecord>(record: &T) -> Result<String, ValidationError> {
    let fields = record.encode_fields();
    debug_assert_eq!(fields.len(), T::FIELD_COUNT, "encode_fields column count");

    let mut line = record.id().to_string();
    for (i, value) in fields.iter().enumerate() {
        let column = T::COLUMNS.get(i).copied().unwrap_or("field");
        validation::validate_plain_text(column, value)?;
        line.push(RESERVED_DELIMITER);
        line.push_str(value);
    }
    Ok(line)
}

/// Decodes one snapshot line into a validated record.
///
/// # Errors
/// `FieldCount` when the column count is off, `InvalidId` for a bad id column, whatever
/// [`FlatRecord::decode_fields`] reports, and `Rejected` if the decoded record fails validation.
pub fn decode_line<T: FlatRecord>(line: &str) -> Result<T, FieldError> {
    let parts: Vec<&str> = line.split(RESERVED_DELIMITER).collect();
    let expected = T::FIELD_COUNT + 1;
    if parts.len() != expected {
        return Err(FieldError::FieldCount {
            expected,
            found: parts.len(),
        });
    }

    let id: EntityId = parts[0].parse()?;
    let record = T::decode_fields(id, &parts[1..])?;
    record.validate()?;
    Ok(record)
}

/// Decodes a whole snapshot, failing on the first malformed line.
///
/// Blank lines are skipped but still counted, so reported line numbers match what an editor
/// shows.
///
/// # Errors
/// A [`ParseError`] naming the 1-based line that failed, including duplicate ids.
pub fn decode_all<T: FlatRecord>(text: &str) -> Result<Vec<T>, ParseError> {
    decode_bytes(text.as_bytes())
}

/// Decodes a snapshot read straight from disk.
///
/// Lines are split on `\n` (a trailing `\r` is dropped) and checked for UTF-8 one at a time,
/// so a corrupt byte is reported against the line it sits on.
///
/// # Errors
/// As [`decode_all`], plus `InvalidUtf8` for a line that is not valid UTF-8.
pub fn decode_bytes<T: FlatRecord>(bytes: &[u8]) -> Result<Vec<T>, ParseError> {
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_no = idx + 1;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = std::str::from_utf8(raw).map_err(|e| ParseError {
            line: line_no,
            source: FieldError::InvalidUtf8 {
                valid_up_to: e.valid_up_to(),
            },
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = decode_line(line).map_err(|source| ParseError {
            line: line_no,
            source,
        })?;
        if !seen.insert(record.id()) {
            return Err(ParseError {
                line: line_no,
                source: FieldError::DuplicateId { id: record.id() },
            });
        }
        records.push(record);
    }

    Ok(records)
}

/// Parses a boolean column. Accepts `true`/`false` in any case.
///
/// # Errors
/// `InvalidValue` for anything else.
pub fn parse_bool(field: &str, value: &str) -> Result<bool, FieldError> {
    let v = value.trim();
    if v.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if v.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FieldError::invalid(field, value, "expected true or false"))
    }
}

/// Parses a numeric column.
///
/// # Errors
/// `InvalidValue` carrying the parser's message.
pub fn parse_number<N>(field: &str, value: &str) -> Result<N, FieldError>
where
    N: FromStr,
    N::Err: Display,
{
    value
        .trim()
        .parse::<N>()
        .map_err(|e| FieldError::invalid(field, value, e.to_string()))
}

/// Parses a date column written as [`DATE_FORMAT`].
///
/// # Errors
/// `InvalidValue` for any other layout or an impossible date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| FieldError::invalid(field, value, e.to_string()))
}

/// Formats a date column.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Contact, ContactFields};
    use crate::entity::Record;

    fn contact(id: u64, name: &str) -> Contact {
        Contact::create(
            EntityId::new(id),
            ContactFields::new(name, "555-0000", "x@y.com"),
        )
        .unwrap()
    }

    #[test]
    fn encode_line_joins_with_delimiter() {
        let line = encode_line(&contact(4, "Alice")).unwrap();
        assert_eq!(line, "4|Alice|555-0000|x@y.com");
    }

    #[test]
    fn encode_line_refuses_delimiter_in_field() {
        let mut c = contact(1, "Alice");
        c.name = "Alice|Bob".to_string();
        assert!(matches!(
            encode_line(&c),
            Err(ValidationError::ReservedCharacter { ref field, character: '|' }) if field == "name"
        ));
    }

    #[test]
    fn decode_line_field_count() {
        let err = decode_line::<Contact>("1|Alice").unwrap_err();
        assert_eq!(err, FieldError::FieldCount { expected: 4, found: 2 });
    }

    #[test]
    fn decode_line_bad_id() {
        assert!(matches!(
            decode_line::<Contact>("one|Alice|555|a@x.com"),
            Err(FieldError::InvalidId { .. })
        ));
        assert!(matches!(
            decode_line::<Contact>("0|Alice|555|a@x.com"),
            Err(FieldError::InvalidId { .. })
        ));
    }

    #[test]
    fn decode_line_validates_record() {
        assert!(matches!(
            decode_line::<Contact>("3| |555|a@x.com"),
            Err(FieldError::Rejected(ValidationError::MissingField { .. }))
        ));
    }

    #[test]
    fn decode_all_skips_blank_lines_but_counts_them() {
        let text = "1|Alice|555-1000|a@x.com\n\n2|Bob|555-2000|b@x.com\n3|Carol\n";
        let err = decode_all::<Contact>(text).unwrap_err();
        assert_eq!(err.line, 4);
    }

    #[test]
    fn decode_all_rejects_duplicate_ids() {
        let text = "1|Alice|555-1000|a@x.com\n1|Bob|555-2000|b@x.com\n";
        let err = decode_all::<Contact>(text).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.source, FieldError::DuplicateId { .. }));
    }

    #[test]
    fn decode_all_handles_crlf() {
        let text = "1|Alice|555-1000|a@x.com\r\n2|Bob|555-2000|b@x.com\r\n";
        let records = decode_all::<Contact>(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].email, "b@x.com");
    }

    #[test]
    fn decode_bytes_reports_invalid_utf8_line() {
        let bytes = b"1|Alice|555-1000|a@x.com\n\n3|Car\xFFol|555|\n";
        let err = decode_bytes::<Contact>(bytes).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.source, FieldError::InvalidUtf8 { valid_up_to: 5 });
    }

    #[test]
    fn typed_column_helpers() {
        assert!(parse_bool("completed", "True").unwrap());
        assert!(!parse_bool("completed", "false").unwrap());
        assert!(parse_bool("completed", "yes").is_err());
        assert_eq!(parse_number::<u32>("quantity", " 12 ").unwrap(), 12);
        assert!(parse_number::<u32>("quantity", "-1").is_err());
        let d = parse_date("due", "2024-12-01").unwrap();
        assert_eq!(format_date(d), "2024-12-01");
        assert!(parse_date("due", "12/01/2024").is_err());
    }
}
