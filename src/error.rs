//! Error types for flatstore.
//!
//! All errors in flatstore are strongly typed using thiserror.
//! This enables pattern matching on specific error conditions
//! and provides clear error messages.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::entity::EntityId;

/// Validation errors that occur when a caller-supplied field breaks a domain constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A text field is longer than the store accepts.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Field name.
        field: String,
        /// Limit in bytes.
        max_length: usize,
    },

    /// A text field holds the snapshot delimiter or a line break.
    #[error("Field '{field}' contains reserved character {character:?}")]
    ReservedCharacter {
        /// Field name.
        field: String,
        /// The offending character.
        character: char,
    },

    /// User input that is not a calendar date.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// Input as given.
        value: String,
    },

    /// An email address without a `local@domain.tld` shape.
    #[error("Invalid email address '{value}'")]
    InvalidEmail {
        /// Input as given.
        value: String,
    },

    /// A number outside its allowed range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidNumber {
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A change that does not apply to this kind of record.
    #[error("Operation '{operation}' is not supported by {kind} devices")]
    UnsupportedOperation {
        /// Requested operation.
        operation: String,
        /// Kind of the record it was aimed at.
        kind: String,
    },
}

/// Errors decoding the fields of a single snapshot line.
///
/// These carry no line number; [`ParseError`] attaches one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Wrong number of `|`-separated columns.
    #[error("expected {expected} fields, found {found}")]
    FieldCount {
        /// Columns the record type has, id included.
        expected: usize,
        /// Columns on the line.
        found: usize,
    },

    /// The id column is not a positive integer.
    #[error("invalid id '{value}'")]
    InvalidId {
        /// Column as written.
        value: String,
    },

    /// A second line with an id already seen.
    #[error("duplicate id {id}")]
    DuplicateId {
        /// The repeated id.
        id: EntityId,
    },

    /// A typed column that does not parse.
    #[error("field '{field}' has invalid value '{value}': {reason}")]
    InvalidValue {
        /// Column name.
        field: String,
        /// Column as written.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The line is not valid UTF-8.
    #[error("invalid UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 {
        /// Length of the valid prefix of the line.
        valid_up_to: usize,
    },

    /// The decoded record failed validation.
    #[error("record rejected: {0}")]
    Rejected(#[from] ValidationError),
}

impl FieldError {
    /// Creates an invalid-value error for a typed field.
    #[must_use]
    pub fn invalid(field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A malformed snapshot line.
///
/// `line` is 1-based, counted over every physical line of the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed snapshot line {line}: {source}")]
pub struct ParseError {
    /// Offending line number (1-based).
    pub line: usize,
    /// What was wrong with it.
    #[source]
    pub source: FieldError,
}

/// Top-level error type for flatstore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record has this id.
    #[error("Entity not found: {id}")]
    NotFound {
        /// The id looked up.
        id: EntityId,
    },

    /// A field broke a domain constraint.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A snapshot line could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Reading or writing a snapshot failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A configuration that cannot work.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with it.
        message: String,
    },
}

impl StoreError {
    /// Creates an I/O error bound to the file it happened on.
    #[must_use]
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a snapshot parse error.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Returns true if this is an I/O error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Line number of a parse error, if this is one.
    #[must_use]
    pub const fn parse_line(&self) -> Option<usize> {
        match self {
            Self::Parse(e) => Some(e.line),
            _ => None,
        }
    }

    /// Kind of the underlying I/O error, if this is one.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only I/O failures can succeed on a second attempt; everything else
    /// needs different input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Result type alias for flatstore operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_missing_field() {
        let err = ValidationError::MissingField {
            field: "name".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("'name'"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_validation_error_reserved_character() {
        let err = ValidationError::ReservedCharacter {
            field: "notes".to_string(),
            character: '|',
        };
        assert!(format!("{err}").contains("'|'"));
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = ParseError {
            line: 3,
            source: FieldError::FieldCount {
                expected: 4,
                found: 2,
            },
        };
        let msg = format!("{err}");
        assert!(msg.contains("line 3"));
        assert!(msg.contains("expected 4 fields, found 2"));
    }

    #[test]
    fn test_store_error_not_found() {
        let err = StoreError::NotFound {
            id: EntityId::new(7),
        };
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("Entity not found: 7"));
    }

    #[test]
    fn test_store_error_from_validation() {
        let err: StoreError = ValidationError::InvalidDate {
            value: "tomorrow".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_error_from_parse() {
        let err: StoreError = ParseError {
            line: 9,
            source: FieldError::InvalidId {
                value: "x".to_string(),
            },
        }
        .into();
        assert!(err.is_parse());
        assert_eq!(err.parse_line(), Some(9));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_store_error_io_is_retryable() {
        let err = StoreError::io(
            Path::new("/tmp/contacts.txt"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_io());
        assert!(err.is_retryable());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        let msg = format!("{err}");
        assert!(msg.contains("contacts.txt"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_field_error_from_validation() {
        let err: FieldError = ValidationError::MissingField {
            field: "title".to_string(),
        }
        .into();
        assert!(matches!(err, FieldError::Rejected(_)));
    }

    #[test]
    fn test_invalid_utf8_line_is_parse_not_io() {
        let err: StoreError = ParseError {
            line: 3,
            source: FieldError::InvalidUtf8 { valid_up_to: 5 },
        }
        .into();
        assert!(err.is_parse());
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("line 3: invalid UTF-8 after byte 5"));
    }
}
