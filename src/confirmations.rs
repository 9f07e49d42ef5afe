//! Confirmation board
//!
//! A volunteer's answer to a shift can live in two places: the shift's own
//! `confirmation_status` and a row in `shift_confirmations`. [`ACTUAL_STATUS`]
//! folds them into one value and every read here filters and sorts on it.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{self, now};
use crate::error::{Result, SchedulingError};
use crate::lifecycle::ShiftState;
use crate::models::{
    ConfirmationFilter, ConfirmationRow, ConfirmationStatus, DutyFilter, DutyListing, DutyPage, DutyType,
    ReliabilityTier, ShiftStatus, Unit, VolunteerStats,
};
use crate::query::{Filter, Operator, QueryBuilder};
use crate::schema::{shift_change_requests, shifts, sms_logs};
use crate::scheduling::{format_clock, format_notice_date};
use crate::shifts::load_state;
use crate::validation::InputValidator;

/// Effective confirmation of a shift `s` joined to its response row `sc`
pub const ACTUAL_STATUS: &str =
    "COALESCE(NULLIF(s.confirmation_status, ''), NULLIF(sc.status, ''), 'pending')";

const CONFIRMATION_SELECT: &str = "SELECT
        s.id AS shift_id, s.shift_date, s.start_time, s.end_time, s.shift_type, s.location,
        s.status AS shift_status, s.confirmation_status,
        sc.status AS response_status, sc.notes AS response_notes, sc.responded_at,
        COALESCE(NULLIF(s.confirmation_status, ''), NULLIF(sc.status, ''), 'pending') AS actual_status,
        s.confirmed_at, s.declined_reason, s.change_request_notes,
        v.id AS volunteer_id, v.first_name || ' ' || v.last_name AS volunteer_name,
        v.email AS volunteer_email, v.contact_number AS volunteer_phone,
        u.id AS unit_id, u.unit_name, u.unit_code
    FROM shifts s
    INNER JOIN volunteers v ON s.volunteer_id = v.id
    LEFT JOIN units u ON s.unit_id = u.id
    LEFT JOIN shift_confirmations sc ON sc.shift_id = s.id AND sc.volunteer_id = v.id";

const DUTY_SELECT: &str = "SELECT da.*, s.shift_date, s.start_time, s.end_time,
        v.first_name || ' ' || v.last_name AS volunteer_name, u.unit_name
    FROM duty_assignments da
    INNER JOIN shifts s ON da.shift_id = s.id
    LEFT JOIN volunteers v ON s.volunteer_id = v.id
    LEFT JOIN units u ON s.unit_id = u.id";

/// Counts of the rows currently on the board
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationSummary {
    /// Rows on the board
    pub total: usize,
    /// Confirmed rows
    pub confirmed: usize,
    /// Rows without a response
    pub pending: usize,
    /// Declined rows
    pub declined: usize,
    /// Rows with a change request
    pub change_requested: usize,
}

impl ConfirmationSummary {
    /// Tally rows by their effective status
    #[must_use]
    pub fn from_rows(rows: &[ConfirmationRow]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Self::default()
        };
        for row in rows {
            match row.actual_status {
                ConfirmationStatus::Confirmed => summary.confirmed += 1,
                ConfirmationStatus::Pending => summary.pending += 1,
                ConfirmationStatus::Declined => summary.declined += 1,
                ConfirmationStatus::ChangeRequested => summary.change_requested += 1,
            }
        }
        summary
    }
}

/// Tier for a confirmation rate, `None` when the volunteer has no shifts
#[must_use]
pub fn reliability_tier(rate: Option<f64>) -> ReliabilityTier {
    match rate {
        None => ReliabilityTier::New,
        Some(rate) if rate >= 80.0 => ReliabilityTier::High,
        Some(rate) if rate >= 60.0 => ReliabilityTier::Medium,
        Some(_) => ReliabilityTier::Low,
    }
}

fn map_confirmation(row: &Row<'_>) -> rusqlite::Result<ConfirmationRow> {
    Ok(ConfirmationRow {
        shift_id: row.get("shift_id")?,
        shift_date: row.get(shifts::SHIFT_DATE)?,
        start_time: row.get(shifts::START_TIME)?,
        end_time: row.get(shifts::END_TIME)?,
        shift_type: row.get(shifts::SHIFT_TYPE)?,
        location: row.get(shifts::LOCATION)?,
        shift_status: row.get("shift_status")?,
        confirmation_status: row.get(shifts::CONFIRMATION_STATUS)?,
        response_status: row.get("response_status")?,
        response_notes: row.get("response_notes")?,
        responded_at: row.get("responded_at")?,
        actual_status: row.get("actual_status")?,
        confirmed_at: row.get(shifts::CONFIRMED_AT)?,
        declined_reason: row.get(shifts::DECLINED_REASON)?,
        change_request_notes: row.get(shifts::CHANGE_REQUEST_NOTES)?,
        volunteer_id: row.get("volunteer_id")?,
        volunteer_name: row.get("volunteer_name")?,
        volunteer_email: row.get("volunteer_email")?,
        volunteer_phone: row.get("volunteer_phone")?,
        unit_id: row.get("unit_id")?,
        unit_name: row.get("unit_name")?,
        unit_code: row.get("unit_code")?,
    })
}

/// Volunteer shifts on the board, declined first and confirmed last
pub fn list_confirmations(
    conn: &Connection,
    filter: &ConfirmationFilter,
    today: NaiveDate,
    window_days: u32,
) -> Result<Vec<ConfirmationRow>> {
    let mut query = QueryBuilder::new(CONFIRMATION_SELECT);
    query.add_condition("s.shift_for = 'volunteer'");
    query.add_condition("v.status = 'approved'");

    match filter.date {
        Some(date) => query.add_filter(Filter::new("s.shift_date", Operator::Equal, date)),
        None => query.add_between(
            "s.shift_date",
            today,
            today + Duration::days(i64::from(window_days)),
        ),
    }
    query.add_optional(ACTUAL_STATUS, Operator::Equal, filter.status.map(ConfirmationStatus::as_str));
    query.add_optional("s.unit_id", Operator::Equal, filter.unit);

    query.add_order_by(
        "CASE actual_status
            WHEN 'declined' THEN 1
            WHEN 'pending' THEN 2
            WHEN 'change_requested' THEN 3
            WHEN 'confirmed' THEN 4
            ELSE 5
        END",
    );
    query.add_order_by("s.shift_date ASC");
    query.add_order_by("s.start_time ASC");

    let (sql, values) = query.build();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_confirmation)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    debug!(count = results.len(), "Loaded confirmation board");
    Ok(results)
}

/// Confirmation history of every approved volunteer with at least one shift
pub fn volunteer_stats(conn: &Connection) -> Result<Vec<VolunteerStats>> {
    let sql = format!(
        "SELECT
            v.id, v.first_name || ' ' || v.last_name, v.email,
            COUNT(DISTINCT s.id),
            COUNT(DISTINCT CASE WHEN {actual} = 'confirmed' THEN s.id END),
            COUNT(DISTINCT CASE WHEN {actual} = 'declined' THEN s.id END),
            COUNT(DISTINCT CASE WHEN {actual} = 'pending' THEN s.id END),
            COUNT(DISTINCT CASE WHEN {actual} = 'change_requested' THEN s.id END),
            MIN(s.shift_date),
            MAX(s.shift_date),
            AVG(CASE WHEN {actual} = 'confirmed' AND COALESCE(sc.responded_at, s.confirmed_at) IS NOT NULL
                THEN (julianday(COALESCE(sc.responded_at, s.confirmed_at)) - julianday(s.created_at)) * 24.0
            END)
        FROM volunteers v
        INNER JOIN shifts s ON s.volunteer_id = v.id AND s.shift_for = 'volunteer'
        LEFT JOIN shift_confirmations sc ON sc.shift_id = s.id AND sc.volunteer_id = v.id
        WHERE v.status = 'approved'
        GROUP BY v.id
        ORDER BY 5 DESC, 4 DESC, v.id",
        actual = ACTUAL_STATUS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        let total_shifts: i64 = row.get(3)?;
        let confirmed: i64 = row.get(4)?;
        let rate = if total_shifts > 0 {
            Some(confirmed as f64 / total_shifts as f64 * 100.0)
        } else {
            None
        };

        Ok(VolunteerStats {
            volunteer_id: row.get(0)?,
            volunteer_name: row.get(1)?,
            email: row.get(2)?,
            total_shifts,
            confirmed,
            declined: row.get(5)?,
            pending: row.get(6)?,
            change_requested: row.get(7)?,
            first_shift_date: row.get(8)?,
            last_shift_date: row.get(9)?,
            avg_confirmation_hours: row.get(10)?,
            confirmation_rate: rate.unwrap_or(0.0),
            reliability: reliability_tier(rate),
        })
    })?;

    let mut results = Vec::new();
    for stats in rows {
        results.push(stats?);
    }
    Ok(results)
}

fn log_change(
    conn: &Connection,
    shift_id: i64,
    volunteer_id: Option<i64>,
    request_type: &str,
    details: &str,
    admin_id: i64,
) -> Result<()> {
    let timestamp = now();
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, 'approved', ?, ?, ?)",
            shift_change_requests::TABLE,
            shift_change_requests::SHIFT_ID,
            shift_change_requests::VOLUNTEER_ID,
            shift_change_requests::REQUEST_TYPE,
            shift_change_requests::REQUEST_DETAILS,
            shift_change_requests::STATUS,
            shift_change_requests::REVIEWED_BY,
            shift_change_requests::REVIEWED_AT,
            shift_change_requests::CREATED_AT
        ),
        params![shift_id, volunteer_id, request_type, details, admin_id, timestamp, timestamp],
    )?;
    Ok(())
}

/// Set a shift's confirmation status on the volunteer's behalf
pub fn update_confirmation(
    conn: &Connection,
    admin_id: i64,
    shift_id: i64,
    status: ConfirmationStatus,
    notes: Option<&str>,
) -> Result<String> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    if let Some(notes) = notes {
        InputValidator::validate_notes(notes)?;
    }

    let (shift, current) = load_state(conn, shift_id)?;
    let next = current.transition(ShiftState::new(current.status, status))?;
    crate::shifts::write_state(conn, shift_id, next)?;

    let details = match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => InputValidator::sanitize_text(notes),
        None => format!("Admin updated confirmation status to: {status}"),
    };
    log_change(conn, shift_id, shift.volunteer_id, "other", &details, admin_id)?;

    info!(shift_id, admin_id, status = %status, "Confirmation status updated");
    Ok("Confirmation status updated successfully!".to_string())
}

/// Move a shift to another volunteer and reset its confirmation
pub fn assign_replacement(
    conn: &Connection,
    admin_id: i64,
    shift_id: i64,
    new_volunteer_id: i64,
) -> Result<String> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    let (shift, current) = load_state(conn, shift_id)?;

    if matches!(
        current.status,
        ShiftStatus::Cancelled | ShiftStatus::Completed | ShiftStatus::Absent
    ) {
        return Err(SchedulingError::validation(format!(
            "Cannot assign a replacement to a {} shift",
            current.status
        )));
    }
    if shift.volunteer_id == Some(new_volunteer_id) {
        return Err(SchedulingError::validation(
            "The replacement must be a different volunteer",
        ));
    }

    let volunteer = db::find_volunteer(conn, new_volunteer_id)?
        .ok_or_else(|| SchedulingError::not_found("Volunteer not found"))?;
    if volunteer.status != "approved" {
        return Err(SchedulingError::validation("Volunteer is not approved"));
    }

    let busy: bool = conn.query_row(
        &format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = ? AND {} = ? AND {} != ?)",
            shifts::TABLE,
            shifts::VOLUNTEER_ID,
            shifts::SHIFT_DATE,
            shifts::ID
        ),
        params![new_volunteer_id, shift.shift_date, shift_id],
        |row| row.get(0),
    )?;
    if busy {
        return Err(SchedulingError::validation(format!(
            "{} already has a shift on {}",
            volunteer.full_name(),
            shift.shift_date
        )));
    }

    let status = match current.status {
        ShiftStatus::Confirmed => ShiftStatus::Scheduled,
        other => other,
    };
    let next = current.transition(ShiftState::new(status, ConfirmationStatus::Pending))?;

    conn.execute(
        &format!(
            "UPDATE {table} SET {volunteer_id} = ?, {user_id} = ?, {shift_for} = 'volunteer',
                {status} = ?, {confirmation} = ?, {confirmed_at} = NULL, {declined_reason} = NULL,
                {change_notes} = NULL, {updated_at} = ?
             WHERE {id} = ?",
            table = shifts::TABLE,
            volunteer_id = shifts::VOLUNTEER_ID,
            user_id = shifts::USER_ID,
            shift_for = shifts::SHIFT_FOR,
            status = shifts::STATUS,
            confirmation = shifts::CONFIRMATION_STATUS,
            confirmed_at = shifts::CONFIRMED_AT,
            declined_reason = shifts::DECLINED_REASON,
            change_notes = shifts::CHANGE_REQUEST_NOTES,
            updated_at = shifts::UPDATED_AT,
            id = shifts::ID
        ),
        params![
            new_volunteer_id,
            volunteer.user_id,
            next.status,
            next.confirmation,
            now(),
            shift_id
        ],
    )?;

    let old = shift
        .volunteer_id
        .map_or_else(|| "none".to_string(), |id| id.to_string());
    log_change(
        conn,
        shift_id,
        Some(new_volunteer_id),
        "swap",
        &format!("Admin reassigned shift from volunteer ID {old} to volunteer ID {new_volunteer_id}"),
        admin_id,
    )?;

    if let Some(user_id) = volunteer.user_id {
        db::notify(
            conn,
            user_id,
            "shift_reassigned",
            "Shift Assigned",
            &format!(
                "You have been assigned a shift on {} from {} to {}. Please confirm your availability.",
                format_notice_date(shift.shift_date),
                format_clock(shift.start_time),
                format_clock(shift.end_time)
            ),
            Some(shift_id),
        )?;
    }

    info!(shift_id, admin_id, old_volunteer = ?shift.volunteer_id, new_volunteer = new_volunteer_id, "Replacement assigned");
    Ok("Volunteer replaced successfully!".to_string())
}

/// Log a reminder SMS to the shift's volunteer
pub fn send_reminder(conn: &Connection, shift_id: i64, volunteer_id: Option<i64>) -> Result<String> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;

    let contact = conn
        .query_row(
            "SELECT v.id, v.first_name, v.last_name, v.contact_number, s.shift_date, s.start_time, s.location
             FROM shifts s
             INNER JOIN volunteers v ON s.volunteer_id = v.id
             WHERE s.id = ?",
            params![shift_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, NaiveDate>(4)?,
                    row.get::<_, chrono::NaiveTime>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?
        .filter(|(id, ..)| volunteer_id.is_none_or(|wanted| wanted == *id))
        .ok_or_else(|| {
            SchedulingError::not_found("Could not send reminder - volunteer information not found.")
        })?;

    let (_, first_name, last_name, phone, shift_date, start_time, location) = contact;
    let recipient = phone
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            SchedulingError::validation("Could not send reminder - volunteer has no contact number.")
        })?;

    let message = format!(
        "Reminder: You have a shift on {} at {} - {}. Please confirm your availability.",
        shift_date.format("%Y-%m-%d"),
        start_time.format("%H:%M:%S"),
        location
    );
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, 'sent', ?)",
            sms_logs::TABLE,
            sms_logs::RECIPIENT,
            sms_logs::MESSAGE,
            sms_logs::STATUS,
            sms_logs::SENT_AT
        ),
        params![recipient, message, now()],
    )?;

    info!(shift_id, "Reminder logged");
    Ok(format!("Reminder sent to {first_name} {last_name}!"))
}

/// Confirmation board with its summary and per-volunteer reliability
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationBoard {
    pub confirmations: Vec<ConfirmationRow>,
    pub summary: ConfirmationSummary,
    pub volunteer_stats: Vec<VolunteerStats>,
    pub units: Vec<Unit>,
}

/// Everything the confirmation page shows
pub fn confirmation_board(
    conn: &Connection,
    filter: &ConfirmationFilter,
    today: NaiveDate,
    window_days: u32,
) -> Result<ConfirmationBoard> {
    let confirmations = list_confirmations(conn, filter, today, window_days)?;
    Ok(ConfirmationBoard {
        summary: ConfirmationSummary::from_rows(&confirmations),
        confirmations,
        volunteer_stats: volunteer_stats(conn)?,
        units: db::list_active_units(conn)?,
    })
}

fn map_duty_listing(row: &Row<'_>) -> rusqlite::Result<DutyListing> {
    Ok(DutyListing {
        duty: crate::scheduling::map_duty(row)?,
        shift_date: row.get(shifts::SHIFT_DATE)?,
        start_time: row.get(shifts::START_TIME)?,
        end_time: row.get(shifts::END_TIME)?,
        volunteer_name: row.get("volunteer_name")?,
        unit_name: row.get("unit_name")?,
    })
}

/// One page of duty assignments, newest first
pub fn list_duty_assignments(conn: &Connection, filter: &DutyFilter, per_page: u32) -> Result<DutyPage> {
    let per_page = per_page.max(1);
    let page = filter.page.unwrap_or(1).max(1);

    let mut query = QueryBuilder::new(DUTY_SELECT);
    query.add_optional("da.shift_id", Operator::Equal, filter.shift_id);
    query.add_optional(
        "da.duty_type",
        Operator::Equal,
        filter.duty_type.map(DutyType::as_str),
    );

    let (count_sql, count_values) = query.build_count();
    let total: i64 = conn.query_row(&count_sql, params_from_iter(count_values.iter()), |row| row.get(0))?;

    query.add_order_by("da.created_at DESC");
    query.add_order_by("da.id DESC");
    query.set_limit(per_page);
    query.set_offset((page - 1).saturating_mul(per_page));

    let (sql, values) = query.build();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_duty_listing)?;

    let mut duties = Vec::new();
    for duty in rows {
        duties.push(duty?);
    }

    let total_pages = u32::try_from(total)
        .unwrap_or(u32::MAX)
        .div_ceil(per_page);

    Ok(DutyPage {
        duties,
        page,
        per_page,
        total,
        total_pages,
    })
}
