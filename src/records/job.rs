//! Job application tracking.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{FieldError, ValidationError};
use crate::storage::snapshot::codec;
use crate::validation;

/// Where an application stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, no response yet.
    #[default]
    Applied,
    /// In the interview loop.
    Interview,
    /// Offer received.
    Offer,
    /// Turned down.
    Rejected,
}

impl ApplicationStatus {
    /// Every status, in menu order.
    pub const ALL: [Self; 4] = [Self::Applied, Self::Interview, Self::Offer, Self::Rejected];

    /// Name as written to snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = FieldError;

    /// Accepts a status name in any case, or its menu number (`0`..=`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim();
        if let Ok(n) = v.parse::<usize>() {
            return Self::ALL
                .get(n)
                .copied()
                .ok_or_else(|| FieldError::invalid("status", s, "no status with that number"));
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(v))
            .ok_or_else(|| FieldError::invalid("status", s, "unknown status"))
    }
}

/// A submitted job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    /// Store-assigned id.
    pub id: EntityId,
    /// Company applied to; required and searched.
    pub company: String,
    /// Position title; required.
    pub job_title: String,
    /// Date the application went out.
    pub applied_on: NaiveDate,
    /// Current status.
    pub status: ApplicationStatus,
    /// Free-form notes.
    pub notes: String,
}

/// Fields for a new [`JobApplication`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobApplicationFields {
    /// Company.
    pub company: String,
    /// Position.
    pub job_title: String,
    /// Date applied.
    pub applied_on: NaiveDate,
    /// Initial status.
    pub status: ApplicationStatus,
    /// Notes.
    pub notes: String,
}

impl JobApplicationFields {
    /// A fresh application in the `Applied` state with no notes.
    #[must_use]
    pub fn new(company: impl Into<String>, job_title: impl Into<String>, applied_on: NaiveDate) -> Self {
        Self {
            company: company.into(),
            job_title: job_title.into(),
            applied_on,
            status: ApplicationStatus::Applied,
            notes: String::new(),
        }
    }
}

/// Partial update for a [`JobApplication`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobApplicationPatch {
    /// New company.
    pub company: Option<String>,
    /// New position.
    pub job_title: Option<String>,
    /// New application date.
    pub applied_on: Option<NaiveDate>,
    /// New status.
    pub status: Option<ApplicationStatus>,
    /// New notes.
    pub notes: Option<String>,
}

impl Record for JobApplication {
    type Fields = JobApplicationFields;
    type Patch = JobApplicationPatch;

    fn create(id: EntityId, fields: JobApplicationFields) -> Result<Self, ValidationError> {
        let app = Self {
            id,
            company: fields.company,
            job_title: fields.job_title,
            applied_on: fields.applied_on,
            status: fields.status,
            notes: fields.notes,
        };
        app.validate()?;
        Ok(app)
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, patch: JobApplicationPatch) -> Result<(), ValidationError> {
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(job_title) = patch.job_title {
            self.job_title = job_title;
        }
        if let Some(applied_on) = patch.applied_on {
            self.applied_on = applied_on;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_non_empty("company", &self.company)?;
        validation::validate_non_empty("job_title", &self.job_title)?;
        validation::validate_plain_text("notes", &self.notes)?;
        Ok(())
    }
}

impl FlatRecord for JobApplication {
    const COLUMNS: &'static [&'static str] =
        &["company", "job_title", "applied_on", "status", "notes"];

    fn encode_fields(&self) -> Vec<String> {
        vec![
            self.company.clone(),
            self.job_title.clone(),
            codec::format_date(self.applied_on),
            self.status.to_string(),
            self.notes.clone(),
        ]
    }

    fn decode_fields(id: EntityId, fields: &[&str]) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            company: fields[0].to_string(),
            job_title: fields[1].to_string(),
            applied_on: codec::parse_date("applied_on", fields[2])?,
            status: fields[3].parse()?,
            notes: fields[4].to_string(),
        })
    }
}

impl Searchable for JobApplication {
    fn search_text(&self) -> &str {
        &self.company
    }
}

impl fmt::Display for JobApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | {} at {} | applied {} | {}",
            self.id,
            self.job_title,
            self.company,
            codec::format_date(self.applied_on),
            self.status
        )?;
        if !self.notes.is_empty() {
            write!(f, " | {}", self.notes)?;
        }
        Ok(())
    }
}
