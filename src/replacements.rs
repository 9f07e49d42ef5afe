//! Replacement search
//!
//! Candidates for a shift are approved, serving volunteers other than the one
//! being replaced who have no shift of any kind on the shift's date. The most
//! reliable recent volunteers come first.

use chrono::{Duration, NaiveDate};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use crate::confirmations::ACTUAL_STATUS;
use crate::db::read_skills;
use crate::error::{Result, SchedulingError};
use crate::models::ReplacementCandidate;
use crate::query::{FilterValue, Operator, QueryBuilder};
use crate::shifts::find_shift;
use crate::validation::InputValidator;

/// Volunteers able to cover `shift_id`, best first.
///
/// `exclude` defaults to the volunteer currently on the shift.
pub fn find_replacements(
    conn: &Connection,
    shift_id: i64,
    exclude: Option<i64>,
    today: NaiveDate,
    lookback_days: u32,
    limit: u32,
) -> Result<Vec<ReplacementCandidate>> {
    let shift_id = InputValidator::validate_shift_id(shift_id)?;
    let shift = find_shift(conn, shift_id)?.ok_or_else(|| SchedulingError::not_found("Shift not found"))?;
    let exclude = exclude.or(shift.volunteer_id);

    // ?1 and ?2 are the lookback window; the builder's `?` placeholders follow them.
    let base = format!(
        "SELECT v.*,
            (SELECT COUNT(*) FROM shifts s
                LEFT JOIN shift_confirmations sc ON sc.shift_id = s.id AND sc.volunteer_id = s.volunteer_id
                WHERE s.volunteer_id = v.id
                  AND {ACTUAL_STATUS} = 'confirmed'
                  AND s.shift_date BETWEEN ?1 AND ?2) AS confirmed_past_month,
            va.assignment_date,
            u.unit_name
        FROM volunteers v
        LEFT JOIN volunteer_assignments va ON va.id = (
            SELECT MAX(a.id) FROM volunteer_assignments a
            WHERE a.volunteer_id = v.id AND LOWER(a.status) = 'active'
        )
        LEFT JOIN units u ON va.unit_id = u.id"
    );

    let mut query = QueryBuilder::new(base);
    query.add_condition("v.status = 'approved'");
    query.add_condition("v.volunteer_status IN ('Active', 'New Volunteer')");
    query.add_optional("v.id", Operator::NotEqual, exclude);
    query.add_bound_condition(
        "NOT EXISTS (SELECT 1 FROM shifts busy WHERE busy.volunteer_id = v.id AND busy.shift_date = ?)",
        vec![FilterValue::Date(shift.shift_date)],
    );
    query.add_order_by("confirmed_past_month DESC");
    query.add_order_by("va.assignment_date IS NULL");
    query.add_order_by("va.assignment_date DESC");
    query.add_order_by("v.id ASC");
    query.set_limit(limit);

    let (sql, values) = query.build();
    let window_start = today - Duration::days(i64::from(lookback_days));
    let mut bound = vec![FilterValue::Date(window_start), FilterValue::Date(today)];
    bound.extend(values);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bound.iter()), |row| {
        Ok(ReplacementCandidate {
            volunteer_id: row.get("id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            contact_number: row.get("contact_number")?,
            volunteer_status: row.get("volunteer_status")?,
            confirmed_past_month: row.get("confirmed_past_month")?,
            assignment_date: row.get("assignment_date")?,
            unit_name: row.get("unit_name")?,
            skills: read_skills(row)?,
        })
    })?;

    let mut candidates = Vec::new();
    for candidate in rows {
        candidates.push(candidate?);
    }
    debug!(shift_id, exclude, count = candidates.len(), "Replacement search");
    Ok(candidates)
}
