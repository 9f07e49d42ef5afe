//! Shift creation
//!
//! The three create forms share one insert path: resolve the volunteer, write
//! the shift, attach the optional duty and notify the volunteer's account.
//! Callers run each form inside a single transaction, so a failure on any
//! shift leaves no rows behind.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SchedulingConfig;
use crate::db::{self, now};
use crate::error::{Result, SchedulingError};
use crate::lifecycle::ShiftState;
use crate::models::{
    CreatedShifts, DutyAssignment, DutyInput, DutyPriority, DutyType, NewBulkShifts,
    NewRecurringShifts, NewSingleShift, ShiftDetail, ShiftFor, ShiftType, Unit, Volunteer,
};
use crate::schema::{duty_assignments, shifts};
use crate::shifts::upcoming_shifts;
use crate::validation::InputValidator;

/// Date format used in notification text, e.g. `Mar 01, 2026`
pub fn format_notice_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Clock format used in notification text, e.g. `6:00 AM`
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Every date in `start..=end` whose weekday is selected, in order
#[must_use]
pub fn expand_recurrence(start: NaiveDate, end: NaiveDate, weekdays: &[Weekday]) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| weekdays.contains(&date.weekday()))
        .collect()
}

/// Map a row that selects every `duty_assignments` column
pub fn map_duty(row: &Row<'_>) -> rusqlite::Result<DutyAssignment> {
    Ok(DutyAssignment {
        id: row.get(duty_assignments::ID)?,
        shift_id: row.get(duty_assignments::SHIFT_ID)?,
        duty_type: row.get(duty_assignments::DUTY_TYPE)?,
        duty_description: row.get(duty_assignments::DUTY_DESCRIPTION)?,
        priority: row.get(duty_assignments::PRIORITY)?,
        required_equipment: row.get(duty_assignments::REQUIRED_EQUIPMENT)?,
        required_training: row.get(duty_assignments::REQUIRED_TRAINING)?,
        notes: row.get(duty_assignments::NOTES)?,
        created_by: row.get(duty_assignments::CREATED_BY)?,
        created_at: row.get(duty_assignments::CREATED_AT)?,
    })
}

/// Form fields shared by the three create actions
struct FormCommon<'a> {
    unit_id: Option<i64>,
    shift_type: ShiftType,
    location: Option<&'a str>,
    notes: Option<&'a str>,
    duty: Option<&'a DutyInput>,
}

/// Validated fields shared by every shift one form submission creates
struct ShiftTemplate<'a> {
    unit_id: Option<i64>,
    shift_type: ShiftType,
    start_time: NaiveTime,
    end_time: NaiveTime,
    location: String,
    notes: String,
    duty: Option<&'a DutyInput>,
    notice: &'static str,
}

impl<'a> ShiftTemplate<'a> {
    fn new(
        conn: &Connection,
        settings: &SchedulingConfig,
        form: FormCommon<'a>,
        times: (NaiveTime, NaiveTime),
    ) -> Result<Self> {
        if let Some(unit_id) = form.unit_id {
            if db::find_unit(conn, unit_id)?.is_none() {
                return Err(SchedulingError::not_found("Unit not found"));
            }
        }

        let notes = match form.notes {
            Some(notes) => {
                InputValidator::validate_notes(notes)?;
                InputValidator::sanitize_text(notes)
            }
            None => String::new(),
        };
        if let Some(duty) = form.duty {
            for text in [&duty.duty_description, &duty.notes].into_iter().flatten() {
                InputValidator::validate_notes(text)?;
            }
        }

        let location = form
            .location
            .map(InputValidator::sanitize_text)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| settings.default_location.clone());

        Ok(Self {
            unit_id: form.unit_id,
            shift_type: form.shift_type,
            start_time: times.0,
            end_time: times.1,
            location,
            notes,
            duty: form.duty,
            notice: "a new shift",
        })
    }

    /// Insert one shift for `volunteer_id` on `date`
    fn create(&self, conn: &Connection, admin_id: i64, volunteer_id: i64, date: NaiveDate) -> Result<i64> {
        let volunteer = db::find_volunteer(conn, volunteer_id)?
            .ok_or_else(|| SchedulingError::not_found(format!("Volunteer {volunteer_id} not found")))?;

        let shift_id = self.insert_shift(conn, admin_id, &volunteer, date)?;
        if let Some(duty) = self.duty {
            let duty_id = attach_duty(conn, admin_id, shift_id, duty)?;
            debug!(shift_id, duty_id, "Duty attached");
        }

        if let Some(user_id) = volunteer.user_id {
            db::notify(
                conn,
                user_id,
                "new_shift",
                "New Shift Assigned",
                &format!(
                    "You have been assigned {} on {} from {} to {}. Please confirm your availability.",
                    self.notice,
                    format_notice_date(date),
                    format_clock(self.start_time),
                    format_clock(self.end_time)
                ),
                Some(shift_id),
            )?;
        }

        Ok(shift_id)
    }

    fn insert_shift(
        &self,
        conn: &Connection,
        admin_id: i64,
        volunteer: &Volunteer,
        date: NaiveDate,
    ) -> Result<i64> {
        let timestamp = now();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                shifts::TABLE,
                shifts::USER_ID,
                shifts::VOLUNTEER_ID,
                shifts::SHIFT_FOR,
                shifts::UNIT_ID,
                shifts::SHIFT_DATE,
                shifts::SHIFT_TYPE,
                shifts::START_TIME,
                shifts::END_TIME,
                shifts::STATUS,
                shifts::CONFIRMATION_STATUS,
                shifts::LOCATION,
                shifts::NOTES,
                shifts::CREATED_BY,
                shifts::CREATED_AT,
                shifts::UPDATED_AT
            ),
            params![
                volunteer.user_id,
                volunteer.id,
                ShiftFor::Volunteer,
                self.unit_id,
                date,
                self.shift_type,
                self.start_time,
                self.end_time,
                ShiftState::NEW.status,
                ShiftState::NEW.confirmation,
                self.location,
                self.notes,
                admin_id,
                timestamp,
                timestamp
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// Insert a duty assignment and link it from its shift
fn attach_duty(conn: &Connection, admin_id: i64, shift_id: i64, duty: &DutyInput) -> Result<i64> {
    let description = duty
        .duty_description
        .as_deref()
        .map(InputValidator::sanitize_text)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| duty.duty_type.default_description().to_string());

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            duty_assignments::TABLE,
            duty_assignments::SHIFT_ID,
            duty_assignments::DUTY_TYPE,
            duty_assignments::DUTY_DESCRIPTION,
            duty_assignments::PRIORITY,
            duty_assignments::REQUIRED_EQUIPMENT,
            duty_assignments::REQUIRED_TRAINING,
            duty_assignments::NOTES,
            duty_assignments::CREATED_BY,
            duty_assignments::CREATED_AT
        ),
        params![
            shift_id,
            duty.duty_type,
            description,
            duty.priority.unwrap_or_default(),
            duty.required_equipment,
            duty.required_training,
            duty.notes,
            admin_id,
            now()
        ],
    )?;
    let duty_id = conn.last_insert_rowid();

    conn.execute(
        &format!(
            "UPDATE {} SET {} = ? WHERE {} = ?",
            shifts::TABLE,
            shifts::DUTY_ASSIGNMENT_ID,
            shifts::ID
        ),
        params![duty_id, shift_id],
    )?;
    Ok(duty_id)
}

/// Start and end for a form that may leave them blank
fn resolve_times(
    shift_type: ShiftType,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(NaiveTime, NaiveTime)> {
    let defaults = shift_type.default_times();
    let start = start.or(defaults.map(|(s, _)| s));
    let end = end.or(defaults.map(|(_, e)| e));

    match (start, end) {
        (Some(start), Some(end)) => {
            InputValidator::validate_time_window(start, end)?;
            Ok((start, end))
        }
        _ => Err(SchedulingError::validation(
            "Start and end times are required for custom shifts.",
        )),
    }
}

/// Create one shift for one volunteer
pub fn create_single_shift(
    conn: &Connection,
    settings: &SchedulingConfig,
    admin_id: i64,
    form: &NewSingleShift,
) -> Result<CreatedShifts> {
    let volunteer_id = InputValidator::validate_volunteer_selected(form.volunteer_id)?;
    let times = resolve_times(form.shift_type, form.start_time, form.end_time)?;

    let common = FormCommon {
        unit_id: form.unit_id,
        shift_type: form.shift_type,
        location: form.location.as_deref(),
        notes: form.notes.as_deref(),
        duty: form.duty.as_ref(),
    };
    let template = ShiftTemplate::new(conn, settings, common, times)?;
    let shift_id = template.create(conn, admin_id, volunteer_id, form.shift_date)?;

    info!(shift_id, volunteer_id, admin_id, date = %form.shift_date, "Shift created");
    Ok(CreatedShifts {
        shift_ids: vec![shift_id],
        message: "Shift created successfully!".to_string(),
    })
}

/// Create a shift on every selected weekday in a date range.
///
/// Volunteers take the generated dates in turn.
pub fn create_recurring_shifts(
    conn: &Connection,
    settings: &SchedulingConfig,
    admin_id: i64,
    form: &NewRecurringShifts,
) -> Result<CreatedShifts> {
    let volunteers = InputValidator::validate_recurring_volunteers(&form.volunteer_ids)?;
    InputValidator::validate_date_range(form.start_date, form.end_date, settings.max_recurrence_days)?;
    InputValidator::validate_weekdays(&form.recurrence_days)?;
    InputValidator::validate_duration_hours(form.duration_hours)?;

    let start = form.shift_time;
    let (end, _) = start.overflowing_add_signed(Duration::hours(i64::from(form.duration_hours)));

    let common = FormCommon {
        unit_id: form.unit_id,
        shift_type: form.shift_type,
        location: form.location.as_deref(),
        notes: form.notes.as_deref(),
        duty: form.duty.as_ref(),
    };
    let mut template = ShiftTemplate::new(conn, settings, common, (start, end))?;
    template.notice = "a new recurring shift";

    let dates = expand_recurrence(form.start_date, form.end_date, &form.recurrence_days);
    let mut shift_ids = Vec::with_capacity(dates.len());
    for (index, date) in dates.into_iter().enumerate() {
        let volunteer_id = volunteers[index % volunteers.len()];
        shift_ids.push(template.create(conn, admin_id, volunteer_id, date)?);
    }

    info!(
        count = shift_ids.len(),
        volunteers = volunteers.len(),
        admin_id,
        "Recurring shifts created"
    );
    Ok(CreatedShifts {
        message: format!("Created {} recurring shifts successfully!", shift_ids.len()),
        shift_ids,
    })
}

/// Create the same shift for several volunteers on one date
pub fn create_bulk_shifts(
    conn: &Connection,
    settings: &SchedulingConfig,
    admin_id: i64,
    form: &NewBulkShifts,
) -> Result<CreatedShifts> {
    let volunteers = InputValidator::validate_bulk_volunteers(&form.volunteer_ids)?;
    InputValidator::validate_time_window(form.start_time, form.end_time)?;

    let common = FormCommon {
        unit_id: form.unit_id,
        shift_type: form.shift_type,
        location: form.location.as_deref(),
        notes: form.notes.as_deref(),
        duty: form.duty.as_ref(),
    };
    let template = ShiftTemplate::new(conn, settings, common, (form.start_time, form.end_time))?;

    let mut shift_ids = Vec::with_capacity(volunteers.len());
    for volunteer_id in volunteers {
        shift_ids.push(template.create(conn, admin_id, volunteer_id, form.shift_date)?);
    }

    info!(count = shift_ids.len(), admin_id, date = %form.shift_date, "Bulk shifts created");
    Ok(CreatedShifts {
        message: format!(
            "Created {} shifts for multiple volunteers successfully!",
            shift_ids.len()
        ),
        shift_ids,
    })
}

/// A shift template offered by the create form
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShiftTypeOption {
    pub value: ShiftType,
    pub label: &'static str,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// A duty from the catalog
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DutyOption {
    pub value: DutyType,
    pub label: &'static str,
    pub description: &'static str,
    pub training: &'static str,
}

/// A duty priority choice
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PriorityOption {
    pub value: DutyPriority,
    pub label: &'static str,
}

/// Data for the create-schedule page
#[derive(Debug, Clone, Serialize)]
pub struct SchedulePage {
    /// Volunteers that can be scheduled
    pub volunteers: Vec<Volunteer>,
    /// Active units
    pub units: Vec<Unit>,
    /// Upcoming non-cancelled shifts keyed by date
    pub shifts_by_date: BTreeMap<NaiveDate, Vec<ShiftDetail>>,
    pub shift_types: Vec<ShiftTypeOption>,
    pub duty_types: Vec<DutyOption>,
    pub priorities: Vec<PriorityOption>,
}

const fn shift_type_label(shift_type: ShiftType) -> &'static str {
    match shift_type {
        ShiftType::Morning => "Morning Shift (6AM-2PM)",
        ShiftType::Afternoon => "Afternoon Shift (2PM-10PM)",
        ShiftType::Evening => "Evening Shift (6PM-2AM)",
        ShiftType::Night => "Night Shift (10PM-6AM)",
        ShiftType::FullDay => "Full Day (8AM-5PM)",
        ShiftType::Custom => "Custom Hours",
    }
}

const fn priority_label(priority: DutyPriority) -> &'static str {
    match priority {
        DutyPriority::Primary => "Primary Duty",
        DutyPriority::Secondary => "Secondary Duty",
        DutyPriority::Support => "Support Role",
    }
}

/// Volunteers, units, upcoming shifts and form options
pub fn schedule_page(conn: &Connection, today: NaiveDate, window_days: u32) -> Result<SchedulePage> {
    let mut shifts_by_date: BTreeMap<NaiveDate, Vec<ShiftDetail>> = BTreeMap::new();
    for shift in upcoming_shifts(conn, today, today + Duration::days(i64::from(window_days)))? {
        shifts_by_date
            .entry(shift.shift.shift_date)
            .or_default()
            .push(shift);
    }

    let shift_types = ShiftType::ALL
        .iter()
        .map(|&value| {
            let times = value.default_times();
            ShiftTypeOption {
                value,
                label: shift_type_label(value),
                start_time: times.map(|(start, _)| start),
                end_time: times.map(|(_, end)| end),
            }
        })
        .collect();

    let duty_types = DutyType::ALL
        .iter()
        .map(|&value| DutyOption {
            value,
            label: value.label(),
            description: value.default_description(),
            training: value.default_training(),
        })
        .collect();

    let priorities = DutyPriority::ALL
        .iter()
        .map(|&value| PriorityOption {
            value,
            label: priority_label(value),
        })
        .collect();

    Ok(SchedulePage {
        volunteers: db::list_active_volunteers(conn)?,
        units: db::list_active_units(conn)?,
        shifts_by_date,
        shift_types,
        duty_types,
        priorities,
    })
}
