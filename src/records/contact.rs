//! Address-book contacts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::validation;

/// A person in the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned id.
    pub id: EntityId,
    /// Display name; required.
    pub name: String,
    /// Free-form phone number.
    pub phone: String,
    /// Email address; empty when unknown.
    pub email: String,
}

/// Fields for a new [`Contact`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Email address.
    pub email: String,
}

impl ContactFields {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}

/// Partial update for a [`Contact`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    /// New name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New email address.
    pub email: Option<String>,
}

impl Record for Contact {
    type Fields = ContactFields;
    type Patch = ContactPatch;

    fn create(id: EntityId, fields: ContactFields) -> Result<Self, ValidationError> {
        let contact = Self {
            id,
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
        };
        contact.validate()?;
        Ok(contact)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: ContactPatch) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("name", &self.name)?;
        validation::validate_plain_text("phone", &self.phone)?;
        validation::validate_email("email", &self.email)?;
        Ok(())
    }
}

impl FlatRecord for Contact {
    const COLUMNS: &'static [&'static str] = &["name", "phone", "email"];

    fn encode_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.phone.clone(), self.email.clone()]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            name: fields[0].to_string(),
            phone: fields[1].to_string(),
            email: fields[2].to_string(),
        })
    }
}

impl Searchable for Contact {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Phone: {}, Email: {}",
            self.id, self.name, self.phone, self.email
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validates() {
        let ok = Contact::create(EntityId::new(1), ContactFields::new("Alice", "555", "a@x.com"));
        assert!(ok.is_ok());

        assert!(matches!(
            Contact::create(EntityId::new(1), ContactFields::new("", "555", "")),
            Err(ValidationError::MissingField { .. })
        ));
        assert!(matches!(
            Contact::create(EntityId::new(1), ContactFields::new("Al", "", "nope")),
            Err(ValidationError::InvalidEmail { .. })
        ));
        assert!(matches!(
            Contact::create(EntityId::new(1), ContactFields::new("Al", "555|1", "")),
            Err(ValidationError::ReservedCharacter { .. })
        ));
    }

    #[test]
    fn display_matches_listing_format() {
        let c = Contact::create(EntityId::new(2), ContactFields::new("Bob", "555-2000", "b@x.com"))
            .unwrap();
        assert_eq!(
            c.to_string(),
            "ID: 2, Name: Bob, Phone: 555-2000, Email: b@x.com"
        );
    }

    #[test]
    fn columns_line_up_with_encoding() {
        let c = Contact::create(EntityId::new(2), ContactFields::new("Bob", "1", "")).unwrap();
        assert_eq!(c.encode_fields().len(), Contact::FIELD_COUNT);
        assert_eq!(Contact::FIELD_COUNT, 3);
    }
}
