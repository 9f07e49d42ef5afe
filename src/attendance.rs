//! Attendance monitoring
//!
//! Reads and admin corrections over `attendance_logs`. Logs are written by
//! [`crate::shifts::update_attendance`]; this module lists, totals, verifies
//! and removes them.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;
use tracing::info;

use crate::db::{self, now};
use crate::error::{Result, SchedulingError};
use crate::models::{
    AttendanceFilter, AttendanceRecord, AttendanceReview, AttendanceStats, AttendanceStatus, Volunteer,
};
use crate::query::{Operator, QueryBuilder};
use crate::schema::attendance_logs;
use crate::validation::InputValidator;

const RECORD_SELECT: &str = "SELECT
        al.id AS attendance_id, al.shift_id, al.volunteer_id,
        COALESCE(v.first_name || ' ' || v.last_name, au.first_name || ' ' || au.last_name) AS volunteer_name,
        al.shift_date, al.check_in, al.check_out, al.attendance_status,
        al.total_hours, al.overtime_hours, al.notes,
        s.shift_type, s.start_time, s.end_time, s.location AS shift_location,
        u.unit_name,
        uv.first_name || ' ' || uv.last_name AS verified_by_name,
        al.verified_at
    FROM attendance_logs al
    INNER JOIN shifts s ON al.shift_id = s.id
    LEFT JOIN volunteers v ON al.volunteer_id = v.id
    LEFT JOIN users au ON al.user_id = au.id
    LEFT JOIN units u ON s.unit_id = u.id
    LEFT JOIN users uv ON al.verified_by = uv.id";

const STATS_SELECT: &str = "SELECT
        COUNT(*),
        COALESCE(SUM(CASE WHEN al.attendance_status = 'present' THEN 1 ELSE 0 END), 0),
        COALESCE(SUM(CASE WHEN al.attendance_status = 'late' THEN 1 ELSE 0 END), 0),
        COALESCE(SUM(CASE WHEN al.attendance_status = 'absent' THEN 1 ELSE 0 END), 0),
        COALESCE(SUM(CASE WHEN al.attendance_status = 'excused' THEN 1 ELSE 0 END), 0),
        COALESCE(SUM(CASE WHEN al.attendance_status = 'on_leave' THEN 1 ELSE 0 END), 0),
        COUNT(DISTINCT al.volunteer_id),
        COALESCE(AVG(al.total_hours), 0.0),
        COALESCE(SUM(al.total_hours), 0.0),
        COALESCE(SUM(al.overtime_hours), 0.0)
    FROM attendance_logs al";

/// Records, totals and the volunteer picker for the monitor page
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceOverview {
    pub records: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
    pub volunteers: Vec<Volunteer>,
}

/// The date window a filter selects, defaulting to the last thirty days
#[must_use]
pub fn date_window(filter: &AttendanceFilter, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        filter.date_from.unwrap_or(today - Duration::days(30)),
        filter.date_to.unwrap_or(today),
    )
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        attendance_id: row.get("attendance_id")?,
        shift_id: row.get("shift_id")?,
        volunteer_id: row.get("volunteer_id")?,
        volunteer_name: row.get("volunteer_name")?,
        shift_date: row.get("shift_date")?,
        check_in: row.get("check_in")?,
        check_out: row.get("check_out")?,
        attendance_status: row.get("attendance_status")?,
        total_hours: row.get("total_hours")?,
        overtime_hours: row.get("overtime_hours")?,
        notes: row.get("notes")?,
        shift_type: row.get("shift_type")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        shift_location: row.get("shift_location")?,
        unit_name: row.get("unit_name")?,
        verified_by_name: row.get("verified_by_name")?,
        verified_at: row.get("verified_at")?,
    })
}

/// Attendance logs in the filter window, newest first
pub fn list_attendance(
    conn: &Connection,
    filter: &AttendanceFilter,
    today: NaiveDate,
) -> Result<Vec<AttendanceRecord>> {
    let (from, to) = date_window(filter, today);

    let mut query = QueryBuilder::new(RECORD_SELECT);
    query.add_between("al.shift_date", from, to);
    query.add_optional("al.volunteer_id", Operator::Equal, filter.volunteer_id);
    query.add_optional(
        "al.attendance_status",
        Operator::Equal,
        filter.status.map(AttendanceStatus::as_str),
    );
    query.add_order_by("al.shift_date DESC");
    query.add_order_by("al.check_in DESC");

    let (sql, values) = query.build();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), map_record)?;

    let mut records = Vec::new();
    for record in rows {
        records.push(record?);
    }
    Ok(records)
}

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

/// Totals over the filter's date window.
///
/// Volunteer and status filters do not narrow the totals.
pub fn attendance_stats(
    conn: &Connection,
    filter: &AttendanceFilter,
    today: NaiveDate,
) -> Result<AttendanceStats> {
    let (from, to) = date_window(filter, today);

    let mut query = QueryBuilder::new(STATS_SELECT);
    query.add_between("al.shift_date", from, to);
    let (sql, values) = query.build();

    let mut stats = conn.query_row(&sql, params_from_iter(values.iter()), |row| {
        Ok(AttendanceStats {
            total_records: row.get(0)?,
            present: row.get(1)?,
            late: row.get(2)?,
            absent: row.get(3)?,
            excused: row.get(4)?,
            on_leave: row.get(5)?,
            unique_volunteers: row.get(6)?,
            avg_hours_per_shift: row.get(7)?,
            total_hours_worked: row.get(8)?,
            total_overtime_hours: row.get(9)?,
            ..AttendanceStats::default()
        })
    })?;

    let total = stats.total_records;
    stats.present_percent = percent(stats.present, total);
    stats.late_percent = percent(stats.late, total);
    stats.absent_percent = percent(stats.absent, total);
    stats.excused_percent = percent(stats.excused, total);
    stats.on_leave_percent = percent(stats.on_leave, total);
    stats.attendance_rate = percent(stats.present + stats.late, total);
    Ok(stats)
}

/// Everything the attendance monitor shows
pub fn attendance_overview(
    conn: &Connection,
    filter: &AttendanceFilter,
    today: NaiveDate,
) -> Result<AttendanceOverview> {
    Ok(AttendanceOverview {
        records: list_attendance(conn, filter, today)?,
        stats: attendance_stats(conn, filter, today)?,
        volunteers: db::list_approved_volunteers(conn)?,
    })
}

/// Verify an attendance log with corrected status, notes and hours
pub fn review_attendance(
    conn: &Connection,
    admin_id: i64,
    attendance_id: i64,
    review: &AttendanceReview,
) -> Result<String> {
    if attendance_id <= 0 {
        return Err(SchedulingError::validation("Missing required parameters."));
    }
    if let Some(notes) = &review.notes {
        InputValidator::validate_notes(notes)?;
    }
    InputValidator::validate_hours("Total hours", review.total_hours)?;
    InputValidator::validate_hours("Overtime hours", review.overtime_hours)?;

    let timestamp = now();
    let updated = conn.execute(
        &format!(
            "UPDATE {table} SET {status} = ?, {notes} = ?, {total} = ?, {overtime} = ?,
                {verified_by} = ?, {verified_at} = ?, {updated_at} = ?
             WHERE {id} = ?",
            table = attendance_logs::TABLE,
            status = attendance_logs::ATTENDANCE_STATUS,
            notes = attendance_logs::NOTES,
            total = attendance_logs::TOTAL_HOURS,
            overtime = attendance_logs::OVERTIME_HOURS,
            verified_by = attendance_logs::VERIFIED_BY,
            verified_at = attendance_logs::VERIFIED_AT,
            updated_at = attendance_logs::UPDATED_AT,
            id = attendance_logs::ID
        ),
        params![
            review.attendance_status,
            review.notes.as_deref().map(InputValidator::sanitize_text),
            review.total_hours,
            review.overtime_hours,
            admin_id,
            timestamp,
            timestamp,
            attendance_id
        ],
    )?;
    if updated == 0 {
        return Err(SchedulingError::not_found("Attendance record not found"));
    }

    info!(attendance_id, admin_id, status = %review.attendance_status, "Attendance reviewed");
    Ok("Attendance record updated successfully!".to_string())
}

/// Remove an attendance log
pub fn delete_attendance(conn: &Connection, attendance_id: i64) -> Result<String> {
    if attendance_id <= 0 {
        return Err(SchedulingError::validation("Missing attendance ID."));
    }

    let deleted = conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?",
            attendance_logs::TABLE,
            attendance_logs::ID
        ),
        params![attendance_id],
    )?;
    if deleted == 0 {
        return Err(SchedulingError::not_found("Attendance record not found"));
    }

    info!(attendance_id, "Attendance record deleted");
    Ok("Attendance record deleted successfully!".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_one_decimal() {
        assert!((percent(1, 3) - 33.3).abs() < f64::EPSILON);
        assert!((percent(2, 3) - 66.7).abs() < f64::EPSILON);
        assert!(percent(5, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_window_is_last_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
        let (from, to) = date_window(&AttendanceFilter::default(), today);
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 9, 18).expect("valid date"));
        assert_eq!(to, today);
    }
}
