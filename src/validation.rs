//! Field validation.
//!
//! Pure functions that check caller-supplied values against domain constraints and return a
//! [`ValidationError`] instead of prompting again. Retry loops belong to whatever interactive
//! shell sits on top of the store.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ValidationError;

/// Column separator of the snapshot format. Never valid inside a field.
pub const RESERVED_DELIMITER: char = '|';

/// Conservative upper bound for free-form text fields.
pub const MAX_TEXT_LEN: usize = 16 * 1024;

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Validate that a text field can be stored in a snapshot line.
///
/// Empty values are allowed here; use [`validate_non_empty`] for required fields.
///
/// # Errors
/// `ReservedCharacter` for `|` or a line break, `FieldTooLong` past [`MAX_TEXT_LEN`].
pub fn validate_plain_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if let Some(character) = value
        .chars()
        .find(|c| *c == RESERVED_DELIMITER || *c == '\n' || *c == '\r')
    {
        return Err(ValidationError::ReservedCharacter {
            field: field.to_string(),
            character,
        });
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(ValidationError::FieldTooLong {
            field: field.to_string(),
            max_length: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Validate a required text field: non-blank and storable.
///
/// # Errors
/// `MissingField` when the trimmed value is empty, otherwise as [`validate_plain_text`].
pub fn validate_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    validate_plain_text(field, value)
}

/// Validate an email address. An empty address means "not provided" and passes.
///
/// # Errors
/// `InvalidEmail` when the value lacks a `local@domain.tld` shape.
pub fn validate_email(field: &str, value: &str) -> Result<(), ValidationError> {
    validate_plain_text(field, value)?;
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    if email_regex().map_or(false, |re| re.is_match(value)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail {
            value: value.to_string(),
        })
    }
}

/// Validate a non-negative, finite quantity such as an energy rating.
///
/// # Errors
/// `InvalidNumber` for NaN, infinities, or negative values.
pub fn validate_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            reason: format!("{value} is not finite"),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            reason: format!("{value} is negative"),
        });
    }
    Ok(())
}

/// Validate a finite reading such as a temperature, which may be negative.
///
/// # Errors
/// `InvalidNumber` for NaN or infinities.
pub fn validate_finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            reason: format!("{value} is not finite"),
        })
    }
}

/// Parse a calendar date typed by a user.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`, ignoring surrounding whitespace.
///
/// # Errors
/// `InvalidDate` for anything else, including out-of-range days such as `2024-02-30`.
///
/// # Examples
///
/// ```
/// use flatstore::validation::parse_date;
///
/// let date = parse_date("2024-03-15").unwrap();
/// assert_eq!(date.to_string(), "2024-03-15");
/// assert!(parse_date("next tuesday").is_err());
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidDate {
            value: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_rejects_delimiter_and_newlines() {
        assert!(validate_plain_text("name", "Alice Smith").is_ok());
        assert!(validate_plain_text("name", "").is_ok());
        assert_eq!(
            validate_plain_text("name", "A|B"),
            Err(ValidationError::ReservedCharacter {
                field: "name".to_string(),
                character: '|',
            })
        );
        assert!(matches!(
            validate_plain_text("notes", "line one\nline two"),
            Err(ValidationError::ReservedCharacter { character: '\n', .. })
        ));
        assert!(matches!(
            validate_plain_text("notes", "x\r"),
            Err(ValidationError::ReservedCharacter { character: '\r', .. })
        ));
    }

    #[test]
    fn plain_text_enforces_length_limit() {
        let long = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            validate_plain_text("notes", &long),
            Err(ValidationError::FieldTooLong { .. })
        ));
    }

    #[test]
    fn non_empty_rejects_blank() {
        assert!(matches!(
            validate_non_empty("name", "   "),
            Err(ValidationError::MissingField { .. })
        ));
        assert!(validate_non_empty("name", " Bob ").is_ok());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("email", "a@x.com").is_ok());
        assert!(validate_email("email", "").is_ok());
        assert!(matches!(
            validate_email("email", "not-an-email"),
            Err(ValidationError::InvalidEmail { .. })
        ));
        assert!(validate_email("email", "a@b").is_err());
    }

    #[test]
    fn numbers() {
        assert!(validate_non_negative("energy", 0.0).is_ok());
        assert!(validate_non_negative("energy", -1.0).is_err());
        assert!(validate_non_negative("energy", f64::NAN).is_err());
        assert!(validate_finite("temperature", -12.5).is_ok());
        assert!(validate_finite("temperature", f64::INFINITY).is_err());
    }

    #[test]
    fn dates() {
        assert_eq!(
            parse_date(" 2024/01/31 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert!(matches!(
            parse_date("2024-02-30"),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(parse_date("").is_err());
    }
}
