//! Personal finance ledger entries.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::storage::snapshot::codec;
use crate::validation;

/// One income or expense entry. Amounts are signed integer cents; expenses are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned id.
    pub id: EntityId,
    /// Signed amount in cents.
    pub amount_cents: i64,
    /// Booking date.
    pub date: NaiveDate,
    /// What it was for; required and searched.
    pub description: String,
    /// Budget category, e.g. `Rent` or `Groceries`.
    pub category: String,
}

impl Transaction {
    /// Returns true for money coming in.
    #[must_use]
    pub const fn is_income(&self) -> bool {
        self.amount_cents > 0
    }

    /// The amount as `-45.20` style text.
    #[must_use]
    pub fn amount_display(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let abs = self.amount_cents.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Fields for a new [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFields {
    /// Signed amount in cents.
    pub amount_cents: i64,
    /// Booking date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// Category.
    pub category: String,
}

impl TransactionFields {
    /// Convenience constructor.
    #[must_use]
    pub fn new(
        amount_cents: i64,
        date: NaiveDate,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            amount_cents,
            date,
            description: description.into(),
            category: category.into(),
        }
    }
}

/// Partial update for a [`Transaction`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    /// New amount.
    pub amount_cents: Option<i64>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<String>,
}

impl Record for Transaction {
    type Fields = TransactionFields;
    type Patch = TransactionPatch;

    fn create(id: EntityId, fields: TransactionFields) -> Result<Self, ValidationError> {
        let tx = Self {
            id,
            amount_cents: fields.amount_cents,
            date: fields.date,
            description: fields.description,
            category: fields.category,
        };
        tx.validate()?;
        Ok(tx)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: TransactionPatch) -> Result<(), ValidationError> {
        if let Some(amount_cents) = patch.amount_cents {
            self.amount_cents = amount_cents;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("description", &self.description)?;
        validation::validate_non_empty("category", &self.category)?;
        Ok(())
    }
}

impl FlatRecord for Transaction {
    const COLUMNS: &'static [&'static str] = &["amount_cents", "date", "description", "category"];

    fn encode_fields(&self) -> Vec<String> {
        vec![
            self.amount_cents.to_string(),
            codec::format_date(self.date),
            self.description.clone(),
            self.category.clone(),
        ]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            amount_cents: codec::parse_number("amount_cents", fields[0])?,
            date: codec::parse_date("date", fields[1])?,
            description: fields[2].to_string(),
            category: fields[3].to_string(),
        })
    }
}

impl Searchable for Transaction {
    fn search_text(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} - Amount: {}",
            codec::format_date(self.date),
            self.category,
            self.description,
            self.amount_display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::snapshot::codec::{decode_line, encode_line};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn display_signs_amount() {
        let rent = Transaction::create(
            EntityId::new(1),
            TransactionFields::new(-120_005, day(), "March rent", "Rent"),
        )
        .unwrap();
        assert_eq!(rent.to_string(), "[2024-03-01] Rent: March rent - Amount: -1200.05");
        assert!(!rent.is_income());

        let pay = Transaction::create(EntityId::new(2), TransactionFields::new(7, day(), "Refund", "Misc"))
            .unwrap();
        assert_eq!(pay.amount_display(), "0.07");
        assert!(pay.is_income());
    }

    #[test]
    fn requires_description_and_category() {
        assert!(matches!(
            Transaction::create(EntityId::new(1), TransactionFields::new(100, day(), "Pay", " ")),
            Err(ValidationError::MissingField { ref field }) if field == "category"
        ));
        assert!(matches!(
            Transaction::create(EntityId::new(1), TransactionFields::new(100, day(), "", "Salary")),
            Err(ValidationError::MissingField { ref field }) if field == "description"
        ));
    }

    #[test]
    fn patch_moves_category_only() {
        let mut tx = Transaction::create(
            EntityId::new(3),
            TransactionFields::new(-4520, day(), "Weekly shop", "Groceries"),
        )
        .unwrap();
        tx.apply(TransactionPatch {
            category: Some("Household".to_string()),
            ..TransactionPatch::default()
        })
        .unwrap();
        assert_eq!(tx.category, "Household");
        assert_eq!(tx.amount_cents, -4520);
        assert_eq!(tx.description, "Weekly shop");
    }

    #[test]
    fn snapshot_columns() {
        let tx = Transaction::create(
            EntityId::new(4),
            TransactionFields::new(-4520, day(), "Weekly shop", "Groceries"),
        )
        .unwrap();
        let line = encode_line(&tx).unwrap();
        assert_eq!(line, "4|-4520|2024-03-01|Weekly shop|Groceries");
        assert_eq!(decode_line::<Transaction>(&line).unwrap(), tx);

        assert!(matches!(
            decode_line::<Transaction>("5|12.50|2024-03-01|Lunch|Food"),
            Err(FieldError::InvalidValue { ref field, .. }) if field == "amount_cents"
        ));
    }
}
