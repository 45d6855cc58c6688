//! To-do items.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::storage::snapshot::codec;
use crate::validation;

/// A to-do item with an optional due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id.
    pub id: EntityId,
    /// Short title; required and searched.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Due date, if any.
    pub due: Option<NaiveDate>,
    /// Whether the task is done.
    pub completed: bool,
}

/// Fields for a new [`Task`]. New tasks start pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Due date.
    pub due: Option<NaiveDate>,
}

impl TaskFields {
    /// A task with a title only.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub fn due_on(mut self, due: NaiveDate) -> Self {
        self.due = Some(due);
        self
    }
}

/// Partial update for a [`Task`].
///
/// `due: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New due date, or `Some(None)` to clear it.
    pub due: Option<Option<NaiveDate>>,
    /// New completion flag.
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Marks the task completed and changes nothing else.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            completed: Some(true),
            ..Self::default()
        }
    }
}

impl Record for Task {
    type Fields = TaskFields;
    type Patch = TaskPatch;

    fn create(id: EntityId, fields: TaskFields) -> Result<Self, ValidationError> {
        let task = Self {
            id,
            title: fields.title,
            description: fields.description,
            due: fields.due,
            completed: false,
        };
        task.validate()?;
        Ok(task)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: TaskPatch) -> Result<(), ValidationError> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due) = patch.due {
            self.due = due;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("title", &self.title)?;
        validation::validate_plain_text("description", &self.description)?;
        Ok(())
    }
}

impl FlatRecord for Task {
    const COLUMNS: &'static [&'static str] = &["title", "description", "due", "completed"];

    fn encode_fields(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.description.clone(),
            self.due.map(codec::format_date).unwrap_or_default(),
            self.completed.to_string(),
        ]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        let due = if fields[2].trim().is_empty() {
            None
        } else {
            Some(codec::parse_date("due", fields[2])?)
        };
        Ok(Self {
            id,
            title: fields[0].to_string(),
            description: fields[1].to_string(),
            due,
            completed: codec::parse_bool("completed", fields[3])?,
        })
    }
}

impl Searchable for Task {
    fn search_text(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "Completed" } else { "Pending" };
        write!(f, "{}: {} - {status}", self.id, self.title)?;
        if let Some(due) = self.due {
            write!(f, " (due {})", codec::format_date(due))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::snapshot::codec::{decode_line, encode_line};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_tasks_are_pending() {
        let t = Task::create(EntityId::new(1), TaskFields::titled("Write report")).unwrap();
        assert!(!t.completed);
        assert_eq!(t.to_string(), "1: Write report - Pending");
    }

    #[test]
    fn complete_patch_only_touches_flag() {
        let mut t = Task::create(
            EntityId::new(1),
            TaskFields::titled("Ship").with_description("v1").due_on(date(2024, 5, 1)),
        )
        .unwrap();
        let before = t.clone();
        t.apply(TaskPatch::complete()).unwrap();
        assert!(t.completed);
        assert_eq!(t.title, before.title);
        assert_eq!(t.description, before.description);
        assert_eq!(t.due, before.due);
    }

    #[test]
    fn due_can_be_cleared() {
        let mut t =
            Task::create(EntityId::new(1), TaskFields::titled("x").due_on(date(2024, 1, 1))).unwrap();
        t.apply(TaskPatch {
            due: Some(None),
            ..TaskPatch::default()
        })
        .unwrap();
        assert!(t.due.is_none());
    }

    #[test]
    fn snapshot_columns() {
        let mut t = Task::create(
            EntityId::new(7),
            TaskFields::titled("Pay rent").due_on(date(2024, 2, 29)),
        )
        .unwrap();
        t.completed = true;
        let line = encode_line(&t).unwrap();
        assert_eq!(line, "7|Pay rent||2024-02-29|true");
        assert_eq!(decode_line::<Task>(&line).unwrap(), t);

        let undated = decode_line::<Task>("8|Call mom|weekly||False").unwrap();
        assert!(undated.due.is_none());
        assert!(!undated.completed);
    }

    #[test]
    fn snapshot_bad_columns() {
        assert!(matches!(
            decode_line::<Task>("1|t|d|2024-13-01|false"),
            Err(FieldError::InvalidValue { ref field, .. }) if field == "due"
        ));
        assert!(matches!(
            decode_line::<Task>("1|t|d||maybe"),
            Err(FieldError::InvalidValue { ref field, .. }) if field == "completed"
        ));
    }
}
