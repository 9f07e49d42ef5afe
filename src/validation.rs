use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::error::{Result, SchedulingError};

/// Longest notes field accepted from a form
pub const MAX_NOTES_LEN: usize = 2000;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a person's first or last name
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SchedulingError::validation("Name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(SchedulingError::validation("Name too long (max 100 characters)"));
        }

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(SchedulingError::validation("Name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate phone number format
    pub fn validate_phone(phone: &str) -> Result<()> {
        if phone.trim().is_empty() {
            return Err(SchedulingError::validation("Phone number cannot be empty"));
        }

        if phone
            .chars()
            .any(|c| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ')))
        {
            return Err(SchedulingError::validation("Phone number contains invalid characters"));
        }

        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits) {
            return Err(SchedulingError::validation(
                "Phone number must be between 7 and 15 digits",
            ));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(SchedulingError::validation("Email cannot be empty"));
        }

        if email.len() > 254 {
            return Err(SchedulingError::validation("Email too long (max 254 characters)"));
        }

        let Some((local_part, domain_part)) = email.split_once('@') else {
            return Err(SchedulingError::validation("Email must contain @ symbol"));
        };

        if domain_part.contains('@') {
            return Err(SchedulingError::validation("Email must have exactly one @ symbol"));
        }

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(SchedulingError::validation("Email local part invalid"));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(SchedulingError::validation("Email domain invalid"));
        }

        Ok(())
    }

    /// A single shift needs a volunteer
    pub fn validate_volunteer_selected(volunteer_id: Option<i64>) -> Result<i64> {
        match volunteer_id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(SchedulingError::validation(
                "Volunteer selection is required. Please select a volunteer.",
            )),
        }
    }

    /// Recurring shifts need at least one volunteer; returns the ids deduplicated
    pub fn validate_recurring_volunteers(volunteer_ids: &[i64]) -> Result<Vec<i64>> {
        let ids = Self::distinct_ids(volunteer_ids);
        if ids.is_empty() {
            return Err(SchedulingError::validation(
                "At least one volunteer must be selected for recurring shifts.",
            ));
        }
        Ok(ids)
    }

    /// Bulk shifts need at least one volunteer; returns the ids deduplicated
    pub fn validate_bulk_volunteers(volunteer_ids: &[i64]) -> Result<Vec<i64>> {
        let ids = Self::distinct_ids(volunteer_ids);
        if ids.is_empty() {
            return Err(SchedulingError::validation(
                "At least one volunteer must be selected for bulk shifts.",
            ));
        }
        Ok(ids)
    }

    /// Shift ids come from query strings and must be positive
    pub fn validate_shift_id(shift_id: i64) -> Result<i64> {
        if shift_id <= 0 {
            return Err(SchedulingError::validation("Invalid shift ID"));
        }
        Ok(shift_id)
    }

    /// Validate a recurrence date range
    pub fn validate_date_range(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<()> {
        if start > end {
            return Err(SchedulingError::validation("Start date cannot be after end date"));
        }

        let days = (end - start).num_days() + 1;
        if days > i64::from(max_days) {
            return Err(SchedulingError::validation(format!(
                "Date range too large ({days} days). Maximum supported range is {max_days} days."
            )));
        }

        Ok(())
    }

    /// At least one weekday must be selected
    pub fn validate_weekdays(weekdays: &[Weekday]) -> Result<()> {
        if weekdays.is_empty() {
            return Err(SchedulingError::validation(
                "At least one day of the week must be selected.",
            ));
        }
        Ok(())
    }

    /// Shift length for recurring shifts
    pub fn validate_duration_hours(hours: u32) -> Result<()> {
        if !(1..=24).contains(&hours) {
            return Err(SchedulingError::validation(
                "Shift duration must be between 1 and 24 hours.",
            ));
        }
        Ok(())
    }

    /// Start and end may not coincide; an end before the start is an overnight shift
    pub fn validate_time_window(start: NaiveTime, end: NaiveTime) -> Result<()> {
        if start == end {
            return Err(SchedulingError::validation(
                "Shift start and end times cannot be the same.",
            ));
        }
        Ok(())
    }

    /// Validate free-form notes
    pub fn validate_notes(notes: &str) -> Result<()> {
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(SchedulingError::validation(format!(
                "Notes too long (max {MAX_NOTES_LEN} characters)"
            )));
        }

        if notes.contains('\0') {
            return Err(SchedulingError::validation("Notes contain invalid characters"));
        }

        Ok(())
    }

    /// Hours on an attendance record
    pub fn validate_hours(label: &str, hours: Option<f64>) -> Result<()> {
        match hours {
            Some(h) if !h.is_finite() || !(0.0..=24.0).contains(&h) => Err(
                SchedulingError::validation(format!("{label} must be between 0 and 24")),
            ),
            _ => Ok(()),
        }
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(SchedulingError::Config("Database URL cannot be empty".to_string()));
        }

        if url.len() > 1000 {
            return Err(SchedulingError::Config("Database URL too long".to_string()));
        }

        if url.contains("://") && !url.starts_with("sqlite:") {
            return Err(SchedulingError::Config(
                "Only SQLite databases are supported".to_string(),
            ));
        }

        Ok(())
    }

    fn distinct_ids(ids: &[i64]) -> Vec<i64> {
        let mut seen = HashSet::new();
        ids.iter()
            .copied()
            .filter(|id| *id > 0 && seen.insert(*id))
            .collect()
    }
}
