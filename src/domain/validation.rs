//! Field-level validation for catalog writes.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::DomainError;
use super::repositories::{AuthorInput, BookInput, BookInstanceInput, NamedInput};
use crate::models::LoanStatus;

pub const NAME_MAX_LEN: usize = 200;
pub const PERSON_NAME_MAX_LEN: usize = 100;
pub const TITLE_MAX_LEN: usize = 200;
pub const SUMMARY_MAX_LEN: usize = 1000;
pub const ISBN_LEN: usize = 13;
pub const IMPRINT_MAX_LEN: usize = 200;

/// Weeks ahead a renewal may push the due date.
pub const RENEWAL_MAX_WEEKS: i64 = 4;
/// Renewal date proposed when the form is first shown.
pub const RENEWAL_DEFAULT_WEEKS: i64 = 3;

/// Field name → messages, serialized as a JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }

    fn required(&mut self, field: &str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else if value.chars().count() > max_len {
            self.add(
                field,
                format!("Ensure this value has at most {} characters.", max_len),
            );
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Parses a form date. Accepts `MM/DD/YYYY` and ISO `YYYY-MM-DD`; blank means unset.
pub fn parse_form_date(value: &str) -> Result<Option<NaiveDate>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map(Some)
        .map_err(|_| "Enter a valid date.".to_string())
}

/// Renders a date the way the authoring forms display it.
pub fn format_form_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

pub fn validate_named(input: &NamedInput) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::new();
    errors.required("name", &input.name, NAME_MAX_LEN);
    errors.into_result()
}

pub fn validate_author(input: &AuthorInput) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::new();
    errors.required("first_name", &input.first_name, PERSON_NAME_MAX_LEN);
    errors.required("last_name", &input.last_name, PERSON_NAME_MAX_LEN);
    if let (Some(born), Some(died)) = (input.date_of_birth, input.date_of_death)
        && died < born
    {
        errors.add("date_of_death", "Date of death cannot precede date of birth.");
    }
    errors.into_result()
}

pub fn validate_book(input: &BookInput) -> Result<(), DomainError> {
    let mut errors = ValidationErrors::new();
    errors.required("title", &input.title, TITLE_MAX_LEN);
    errors.required("summary", &input.summary, SUMMARY_MAX_LEN);
    if input.isbn.chars().count() != ISBN_LEN {
        errors.add(
            "isbn",
            format!("ISBN must be exactly {} characters.", ISBN_LEN),
        );
    }
    errors.into_result()
}

/// Checks the instance fields and resolves the requested status.
///
/// A missing status falls back to `Maintenance`; any status may follow any other.
pub fn validate_book_instance(input: &BookInstanceInput) -> Result<LoanStatus, DomainError> {
    let mut errors = ValidationErrors::new();
    errors.required("imprint", &input.imprint, IMPRINT_MAX_LEN);
    let status = match input.status.as_deref() {
        None | Some("") => LoanStatus::default(),
        Some(raw) => match LoanStatus::parse(raw) {
            Some(status) => status,
            None => {
                errors.add(
                    "status",
                    format!("Select a valid choice. {} is not one of the available choices.", raw),
                );
                LoanStatus::default()
            }
        },
    };
    errors.into_result()?;
    Ok(status)
}

pub fn validate_renewal(renewal_date: NaiveDate, today: NaiveDate) -> Result<(), DomainError> {
    if renewal_date < today {
        return Err(DomainError::field(
            "renewal_date",
            "Invalid date - renewal in past",
        ));
    }
    if renewal_date > today + Duration::weeks(RENEWAL_MAX_WEEKS) {
        return Err(DomainError::field(
            "renewal_date",
            "Invalid date - renewal more than 4 weeks ahead",
        ));
    }
    Ok(())
}
