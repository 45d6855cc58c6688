//! Inventory items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::storage::snapshot::codec;
use crate::validation;

/// A stocked product. Prices are integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned id.
    pub id: EntityId,
    /// Product name; required and searched.
    pub name: String,
    /// Units on hand.
    pub quantity: u32,
    /// Unit price in cents.
    pub price_cents: u64,
}

impl Product {
    /// Value of all units on hand, in cents. Saturates instead of overflowing.
    #[must_use]
    pub fn stock_value_cents(&self) -> u64 {
        self.price_cents.saturating_mul(u64::from(self.quantity))
    }
}

/// Fields for a new [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    /// Name.
    pub name: String,
    /// Units on hand.
    pub quantity: u32,
    /// Unit price in cents.
    pub price_cents: u64,
}

impl ProductFields {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32, price_cents: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price_cents,
        }
    }
}

/// Partial update for a [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    /// New name.
    pub name: Option<String>,
    /// New quantity.
    pub quantity: Option<u32>,
    /// New unit price.
    pub price_cents: Option<u64>,
}

impl Record for Product {
    type Fields = ProductFields;
    type Patch = ProductPatch;

    fn create(id: EntityId, fields: ProductFields) -> Result<Self, ValidationError> {
        let product = Self {
            id,
            name: fields.name,
            quantity: fields.quantity,
            price_cents: fields.price_cents,
        };
        product.validate()?;
        Ok(product)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: ProductPatch) -> Result<(), ValidationError> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(price_cents) = patch.price_cents {
            self.price_cents = price_cents;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("name", &self.name)
    }
}

impl FlatRecord for Product {
    const COLUMNS: &'static [&'static str] = &["name", "quantity", "price_cents"];

    fn encode_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.quantity.to_string(),
            self.price_cents.to_string(),
        ]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            name: fields[0].to_string(),
            quantity: codec::parse_number("quantity", fields[1])?,
            price_cents: codec::parse_number("price_cents", fields[2])?,
        })
    }
}

impl Searchable for Product {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Quantity: {}, Price: ${}.{:02}",
            self.id,
            self.name,
            self.quantity,
            self.price_cents / 100,
            self.price_cents % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::snapshot::codec::decode_line;

    #[test]
    fn display_formats_cents() {
        let p = Product::create(EntityId::new(4), ProductFields::new("Widget", 3, 1205)).unwrap();
        assert_eq!(p.to_string(), "ID: 4, Name: Widget, Quantity: 3, Price: $12.05");
        assert_eq!(p.stock_value_cents(), 3615);
    }

    #[test]
    fn update_quantity_and_price_keeps_name() {
        let mut p = Product::create(EntityId::new(1), ProductFields::new("Bolt", 10, 25)).unwrap();
        p.apply(ProductPatch {
            quantity: Some(8),
            price_cents: Some(30),
            ..ProductPatch::default()
        })
        .unwrap();
        assert_eq!((p.name.as_str(), p.quantity, p.price_cents), ("Bolt", 8, 30));
    }

    #[test]
    fn decode_rejects_negative_quantity() {
        assert!(matches!(
            decode_line::<Product>("1|Bolt|-2|25"),
            Err(FieldError::InvalidValue { ref field, .. }) if field == "quantity"
        ));
        assert_eq!(decode_line::<Product>("1|Bolt|2|25").unwrap().quantity, 2);
    }
}
