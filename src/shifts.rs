//! Shift listing, detail, edits, attendance and cancellation
//!
//! Every status change goes through [`ShiftState`], so a shift can never be
//! written in a combination the lifecycle rejects.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::confirmations::ACTUAL_STATUS;
use crate::db::{self, now};
use crate::error::{Result, SchedulingError};
use crate::lifecycle::ShiftState;
use crate::models::{
    AttendanceUpdate, ConfirmationStatus, DateBucket, Shift, ShiftDetail, ShiftFilter, ShiftStats,
    ShiftStatus, ShiftUpdate, Unit,
};
use crate::query::{contains_pattern, Filter, Operator, QueryBuilder};
use crate::schema::{attendance_logs, duty_assignments, shifts};
use crate::validation::InputValidator;

/// Shift columns joined with unit, creator, assignee and duty
pub(crate) const SHIFT_DETAIL_SELECT: &str = "SELECT s.*,
        u.unit_name, u.unit_code, u.unit_type,
        creator.first_name || ' ' || creator.last_name AS created_by_name,
        da.duty_type, da.duty_description, da.priority AS duty_priority,
        da.required_equipment, da.required_training, da.notes AS duty_notes,
        CASE
            WHEN s.shift_for = 'user' THEN usr.first_name || ' ' || usr.last_name
            WHEN s.shift_for = 'volunteer' THEN v.first_name || ' ' || v.last_name
        END AS assigned_to_name,
        CASE
            WHEN s.shift_for = 'user' THEN usr.email
            WHEN s.shift_for = 'volunteer' THEN v.email
        END AS assigned_to_email
    FROM shifts s
    LEFT JOIN units u ON s.unit_id = u.id
    LEFT JOIN users creator ON s.created_by = creator.id
    LEFT JOIN users usr ON s.user_id = usr.id
    LEFT JOIN volunteers v ON s.volunteer_id = v.id
    LEFT JOIN duty_assignments da ON s.duty_assignment_id = da.id";

/// Columns searched by the free-text filter
const SEARCH_COLUMNS: [&str; 11] = [
    "u.unit_name",
    "u.unit_code",
    "usr.first_name",
    "usr.last_name",
    "v.first_name",
    "v.last_name",
    "s.location",
    "da.duty_type",
    "da.duty_description",
    "usr.email",
    "v.email",
];

/// Everything the shift list page shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftOverview {
    pub shifts: Vec<ShiftDetail>,
    pub stats: ShiftStats,
    pub duty_types: Vec<String>,
    pub units: Vec<Unit>,
}

/// Map a row that selects every `shifts` column
pub fn map_shift(row: &Row<'_>) -> rusqlite::Result<Shift> {
    Ok(Shift {
        id: row.get(shifts::ID)?,
        user_id: row.get(shifts::USER_ID)?,
        volunteer_id: row.get(shifts::VOLUNTEER_ID)?,
        shift_for: row.get(shifts::SHIFT_FOR)?,
        unit_id: row.get(shifts::UNIT_ID)?,
        shift_type: row.get(shifts::SHIFT_TYPE)?,
        shift_date: row.get(shifts::SHIFT_DATE)?,
        start_time: row.get(shifts::START_TIME)?,
        end_time: row.get(shifts::END_TIME)?,
        location: row.get(shifts::LOCATION)?,
        status: row.get(shifts::STATUS)?,
        confirmation_status: row.get(shifts::CONFIRMATION_STATUS)?,
        confirmed_at: row.get(shifts::CONFIRMED_AT)?,
        declined_reason: row.get(shifts::DECLINED_REASON)?,
        change_request_notes: row.get(shifts::CHANGE_REQUEST_NOTES)?,
        duty_assignment_id: row.get(shifts::DUTY_ASSIGNMENT_ID)?,
        notes: row.get(shifts::NOTES)?,
        attendance_status: row.get(shifts::ATTENDANCE_STATUS)?,
        check_in: row.get(shifts::CHECK_IN)?,
        check_out: row.get(shifts::CHECK_OUT)?,
        attendance_notes: row.get(shifts::ATTENDANCE_NOTES)?,
        created_by: row.get(shifts::CREATED_BY)?,
        created_at: row.get(shifts::CREATED_AT)?,
        updated_at: row.get(shifts::UPDATED_AT)?,
    })
}

/// Map a row produced by [`SHIFT_DETAIL_SELECT`]
pub fn map_shift_detail(row: &Row<'_>) -> rusqlite::Result<ShiftDetail> {
    Ok(ShiftDetail {
        shift: map_shift(row)?,
        unit_name: row.get("unit_name")?,
        unit_code: row.get("unit_code")?,
        unit_type: row.get("unit_type")?,
        created_by_name: row.get("created_by_name")?,
        duty_type: row.get(duty_assignments::DUTY_TYPE)?,
        duty_description: row.get(duty_assignments::DUTY_DESCRIPTION)?,
        duty_priority: row.get("duty_priority")?,
        required_equipment: row.get(duty_assignments::REQUIRED_EQUIPMENT)?,
        required_training: row.get(duty_assignments::REQUIRED_TRAINING)?,
        duty_notes: row.get("duty_notes")?,
        assigned_to_name: row.get("assigned_to_name")?,
        assigned_to_email: row.get("assigned_to_email")?,
    })
}

fn query_details(conn: &Connection, query: &QueryBuilder) -> Result<Vec<ShiftDetail>> {
    let (sql, values) = query.build();
    debug!(%sql, "Listing shifts");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_shift_detail)?;

    let mut results = Vec::new();
    for shift in rows {
        results.push(shift?);
    }
    Ok(results)
}

/// Shifts matching the list filters, newest date first
pub fn list_shifts(conn: &Connection, filter: &ShiftFilter, today: NaiveDate) -> Result<Vec<ShiftDetail>> {
    let mut query = QueryBuilder::new(SHIFT_DETAIL_SELECT);

    query.add_optional("s.status", Operator::Equal, filter.status.map(ShiftStatus::as_str));
    if let Some(bucket) = filter.date {
        add_date_bucket(&mut query, bucket, today);
    }
    query.add_optional("s.unit_id", Operator::Equal, filter.unit);
    if let Some(search) = &filter.search {
        query.add_search(&SEARCH_COLUMNS, search);
    }
    if let Some(duty_type) = &filter.duty_type {
        query.add_filter(Filter::new(
            "da.duty_type",
            Operator::Like,
            contains_pattern(duty_type),
        ));
    }
    query.add_order_by("s.shift_date DESC");
    query.add_order_by("s.start_time ASC");

    query_details(conn, &query)
}

fn add_date_bucket(query: &mut QueryBuilder, bucket: DateBucket, today: NaiveDate) {
    const COLUMN: &str = "s.shift_date";
    match bucket {
        DateBucket::Today => query.add_filter(Filter::new(COLUMN, Operator::Equal, today)),
        DateBucket::Tomorrow => {
            query.add_filter(Filter::new(COLUMN, Operator::Equal, today + Duration::days(1)));
        }
        DateBucket::Week => query.add_between(COLUMN, today, today + Duration::days(7)),
        DateBucket::Month => query.add_between(COLUMN, today, today + Duration::days(30)),
        DateBucket::Past => query.add_filter(Filter::new(COLUMN, Operator::LessThan, today)),
        DateBucket::Future => query.add_filter(Filter::new(COLUMN, Operator::GreaterThan, today)),
    }
}

/// Non-cancelled shifts dated `from` through `to`, earliest first
pub fn upcoming_shifts(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Vec<ShiftDetail>> {
    let mut query = QueryBuilder::new(SHIFT_DETAIL_SELECT);
    query.add_between("s.shift_date", from, to);
    query.add_filter(Filter::new(
        "s.status",
        Operator::NotEqual,
        ShiftStatus::Cancelled.as_str(),
    ));
    query.add_order_by("s.shift_date");
    query.add_order_by("s.start_time");

    query_details(conn, &query)
}

/// Counters shown above the shift list
pub fn shift_stats(conn: &Connection, today: NaiveDate) -> Result<ShiftStats> {
    let sql = "SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN shift_date >= ?1 AND status != 'cancelled' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN shift_date = ?1 AND status != 'cancelled' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN duty_assignment_id IS NOT NULL THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN confirmation_status = 'pending' AND shift_for = 'volunteer' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN confirmation_status = 'confirmed' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN attendance_status = 'checked_in' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN attendance_status = 'absent' THEN 1 ELSE 0 END), 0)
        FROM shifts";

    let stats = conn.query_row(sql, params![today], |row| {
        Ok(ShiftStats {
            total: row.get(0)?,
            upcoming: row.get(1)?,
            completed: row.get(2)?,
            cancelled: row.get(3)?,
            today: row.get(4)?,
            with_duty: row.get(5)?,
            pending_confirmation: row.get(6)?,
            confirmed: row.get(7)?,
            checked_in: row.get(8)?,
            absent: row.get(9)?,
        })
    })?;
    Ok(stats)
}

/// Duty types that appear on at least one assignment
pub fn distinct_duty_types(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {col} FROM {table} ORDER BY {col}",
        col = duty_assignments::DUTY_TYPE,
        table = duty_assignments::TABLE
    ))?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for duty_type in rows {
        results.push(duty_type?);
    }
    Ok(results)
}

/// Shift list, statistics and filter options in one read
pub fn shift_overview(conn: &Connection, filter: &ShiftFilter, today: NaiveDate) -> Result<ShiftOverview> {
    Ok(ShiftOverview {
        shifts: list_shifts(conn, filter, today)?,
        stats: shift_stats(conn, today)?,
        duty_types: distinct_duty_types(conn)?,
        units: db::list_units(conn)?,
    })
}

/// Plain shift row
pub fn find_shift(conn: &Connection, shift_id: i64) -> Result<Option<Shift>> {
    let shift = conn
        .query_row(
            &format!("SELECT * FROM {} WHERE {} = ?", shifts::TABLE, shifts::ID),
            params![shift_id],
            map_shift,
        )
        .optional()?;
    Ok(shift)
}

/// Shift with its joined unit, creator, duty and assignee
pub fn get_shift_details(conn: &Connection, shift_id: i64) -> Result<ShiftDetail> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;

    conn.query_row(
        &format!("{SHIFT_DETAIL_SELECT} WHERE s.id = ?"),
        params![shift_id],
        map_shift_detail,
    )
    .optional()?
    .ok_or_else(|| SchedulingError::not_found("Shift not found"))
}

/// Load a shift together with its effective status pair
pub fn load_state(conn: &Connection, shift_id: i64) -> Result<(Shift, ShiftState)> {
    let shift = find_shift(conn, shift_id)?.ok_or_else(|| SchedulingError::not_found("Shift not found"))?;

    let confirmation: ConfirmationStatus = conn.query_row(
        &format!(
            "SELECT {ACTUAL_STATUS} FROM shifts s
             LEFT JOIN shift_confirmations sc ON sc.shift_id = s.id AND sc.volunteer_id = s.volunteer_id
             WHERE s.id = ?"
        ),
        params![shift_id],
        |row| row.get(0),
    )?;

    let state = ShiftState::new(shift.status, confirmation);
    Ok((shift, state))
}

/// Write a status pair onto a shift
///
/// `confirmed_at` is stamped when the shift becomes confirmed and cleared
/// when it stops being confirmed.
pub(crate) fn write_state(conn: &Connection, shift_id: i64, state: ShiftState) -> Result<()> {
    let timestamp = now();
    conn.execute(
        &format!(
            "UPDATE {table} SET {status} = ?1, {confirmation} = ?2,
                {confirmed_at} = CASE
                    WHEN ?2 <> 'confirmed' THEN NULL
                    WHEN {confirmation} = 'confirmed' AND {confirmed_at} IS NOT NULL THEN {confirmed_at}
                    ELSE ?3
                END,
                {updated_at} = ?3
             WHERE {id} = ?4",
            table = shifts::TABLE,
            status = shifts::STATUS,
            confirmation = shifts::CONFIRMATION_STATUS,
            confirmed_at = shifts::CONFIRMED_AT,
            updated_at = shifts::UPDATED_AT,
            id = shifts::ID
        ),
        params![state.status, state.confirmation, timestamp, shift_id],
    )?;
    Ok(())
}

/// Admin edit of status, confirmation and notes
pub fn update_shift(conn: &Connection, admin_id: i64, shift_id: i64, update: &ShiftUpdate) -> Result<String> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    if let Some(notes) = &update.notes {
        InputValidator::validate_notes(notes)?;
    }

    let (_, current) = load_state(conn, shift_id)?;
    let status = update.status.unwrap_or(current.status);
    let confirmation = match (update.status, update.confirmation_status) {
        (_, Some(confirmation)) => confirmation,
        (Some(ShiftStatus::Cancelled), None) => ConfirmationStatus::Declined,
        (_, None) => current.confirmation,
    };
    let next = current.transition(ShiftState::new(status, confirmation))?;

    write_state(conn, shift_id, next)?;
    if let Some(notes) = &update.notes {
        conn.execute(
            &format!(
                "UPDATE {} SET {} = ? WHERE {} = ?",
                shifts::TABLE,
                shifts::NOTES,
                shifts::ID
            ),
            params![InputValidator::sanitize_text(notes), shift_id],
        )?;
    }

    db::notify(
        conn,
        admin_id,
        "shift_updated",
        "Shift Updated",
        &format!("Shift #{shift_id} has been updated by admin"),
        Some(shift_id),
    )?;

    info!(shift_id, admin_id, status = %next.status, confirmation = %next.confirmation, "Shift updated");
    Ok("Shift updated successfully".to_string())
}

/// Admin edit of attendance fields, mirrored into the attendance log
pub fn update_attendance(
    conn: &Connection,
    admin_id: i64,
    shift_id: i64,
    update: &AttendanceUpdate,
) -> Result<String> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    if let Some(notes) = &update.attendance_notes {
        InputValidator::validate_notes(notes)?;
    }
    if find_shift(conn, shift_id)?.is_none() {
        return Err(SchedulingError::not_found("Shift not found"));
    }

    let total_hours = match (update.check_in, update.check_out) {
        (Some(check_in), Some(check_out)) if check_out < check_in => {
            return Err(SchedulingError::validation(
                "Check-out time cannot be before check-in time",
            ));
        }
        (Some(check_in), Some(check_out)) => {
            Some(((check_out - check_in).num_minutes() as f64 / 60.0 * 100.0).round() / 100.0)
        }
        _ => None,
    };
    let notes = update.attendance_notes.as_deref().map(InputValidator::sanitize_text);
    let timestamp = now();

    conn.execute(
        &format!(
            "UPDATE {table} SET {status} = ?, {check_in} = ?, {check_out} = ?, {notes} = ?, {updated_at} = ?
             WHERE {id} = ?",
            table = shifts::TABLE,
            status = shifts::ATTENDANCE_STATUS,
            check_in = shifts::CHECK_IN,
            check_out = shifts::CHECK_OUT,
            notes = shifts::ATTENDANCE_NOTES,
            updated_at = shifts::UPDATED_AT,
            id = shifts::ID
        ),
        params![
            update.attendance_status,
            update.check_in,
            update.check_out,
            notes,
            timestamp,
            shift_id
        ],
    )?;

    if update.check_in.is_some() || update.check_out.is_some() {
        conn.execute(
            &format!(
                "INSERT INTO {table} ({shift_id}, {volunteer_id}, {user_id}, {shift_date}, {check_in}, {check_out},
                    {status}, {total_hours}, {notes}, {created_at}, {updated_at})
                 SELECT s.id, s.volunteer_id, s.user_id, s.shift_date, ?1, ?2, ?3, ?4, ?5, ?6, ?6
                 FROM shifts s WHERE s.id = ?7
                 ON CONFLICT ({shift_id}) DO UPDATE SET
                    {check_in} = excluded.{check_in},
                    {check_out} = excluded.{check_out},
                    {status} = excluded.{status},
                    {total_hours} = COALESCE(excluded.{total_hours}, {table}.{total_hours}),
                    {notes} = excluded.{notes},
                    {updated_at} = excluded.{updated_at}",
                table = attendance_logs::TABLE,
                shift_id = attendance_logs::SHIFT_ID,
                volunteer_id = attendance_logs::VOLUNTEER_ID,
                user_id = attendance_logs::USER_ID,
                shift_date = attendance_logs::SHIFT_DATE,
                check_in = attendance_logs::CHECK_IN,
                check_out = attendance_logs::CHECK_OUT,
                status = attendance_logs::ATTENDANCE_STATUS,
                total_hours = attendance_logs::TOTAL_HOURS,
                notes = attendance_logs::NOTES,
                created_at = attendance_logs::CREATED_AT,
                updated_at = attendance_logs::UPDATED_AT
            ),
            params![
                update.check_in,
                update.check_out,
                update.attendance_status,
                total_hours,
                notes,
                timestamp,
                shift_id
            ],
        )?;
        debug!(shift_id, "Attendance log upserted");
    }

    db::notify(
        conn,
        admin_id,
        "attendance_updated",
        "Attendance Updated",
        &format!("Attendance for Shift #{shift_id} has been updated by admin"),
        Some(shift_id),
    )?;

    info!(shift_id, admin_id, status = %update.attendance_status, "Attendance updated");
    Ok("Attendance updated successfully".to_string())
}

/// Cancel a shift. A second cancel succeeds without writing anything.
///
/// Returns the message and whether the shift changed.
pub fn cancel_shift(conn: &Connection, admin_id: i64, shift_id: i64) -> Result<(String, bool)> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    let (shift, current) = load_state(conn, shift_id)?;
    let (next, changed) = current.cancel()?;

    // An older cancelled row may only carry "declined" on its response row
    if !changed && shift.confirmation_status != Some(next.confirmation) {
        write_state(conn, shift_id, next)?;
    }

    if changed {
        write_state(conn, shift_id, next)?;
        db::notify(
            conn,
            admin_id,
            "shift_cancelled",
            "Shift Cancelled",
            &format!("Shift #{shift_id} has been cancelled by admin"),
            Some(shift_id),
        )?;
        info!(shift_id, admin_id, "Shift cancelled");
    } else {
        debug!(shift_id, "Shift already cancelled");
    }

    Ok(("Shift cancelled successfully".to_string(), changed))
}
