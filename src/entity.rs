//! Entity identity and the contracts a stored record implements.
//!
//! Every record held by an [`EntityStore`](crate::storage::EntityStore) is keyed by an
//! [`EntityId`] the store hands out. The id is assigned once and never changes; records expose
//! it but provide no way to overwrite it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, ValidationError};

/// Store-assigned, monotonically increasing entity identifier.
///
/// Ids start at 1. Zero is never assigned and is rejected when read back from a snapshot.
///
/// # Examples
///
/// ```
/// use flatstore::EntityId;
///
/// let id = EntityId::new(1);
/// assert_eq!(id.next(), EntityId::new(2));
/// assert_eq!(id.to_string(), "1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The first id a fresh store assigns.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(FieldError::InvalidId {
                value: s.to_string(),
            }),
            Ok(raw) => Ok(Self(raw)),
        }
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// A record type an [`EntityStore`](crate::storage::EntityStore) can own.
///
/// `Fields` is everything needed to create a record except its id. `Patch` carries one
/// `Option` per mutable field; `None` keeps the current value.
pub trait Record: Clone {
    /// Creation payload.
    type Fields;

    /// Partial update.
    type Patch;

    /// Builds a record with the store-assigned id and validates it.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if any field breaks a domain constraint.
    fn create(id: EntityId, fields: Self::Fields) -> Result<Self, ValidationError>;

    /// The record's id.
    fn id(&self) -> EntityId;

    /// Overwrites the fields set in `patch`.
    ///
    /// The store calls this on a copy and runs [`validate`](Self::validate) afterwards, so
    /// implementations only reject patches that make no sense for this record's shape.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the patch cannot apply to this record.
    fn apply(&mut self, patch: Self::Patch) -> Result<(), ValidationError>;

    /// Checks every domain constraint on the current field values.
    ///
    /// # Errors
    /// Returns the first constraint that does not hold.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A record that can be written to and read back from a delimited snapshot line.
///
/// The snapshot codec owns the id column; implementors only see the remaining fields.
pub trait FlatRecord: Record {
    /// Names of the columns after the id, in order. Used in error messages.
    const COLUMNS: &'static [&'static str];

    /// Number of fields after the id.
    const FIELD_COUNT: usize = Self::COLUMNS.len();

    /// Encodes every non-id field, in column order.
    fn encode_fields(&self) -> Vec<String>;

    /// Rebuilds a record from its non-id fields.
    ///
    /// `fields.len()` is guaranteed to equal [`Self::FIELD_COUNT`].
    ///
    /// # Errors
    /// Returns a [`FieldError`] for any field that does not parse.
    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError>;
}

/// A record with a canonical text column for name/title search.
pub trait Searchable {
    /// The text that [`EntityStore::search`](crate::storage::EntityStore::search) matches against.
    fn search_text(&self) -> &str;
}
