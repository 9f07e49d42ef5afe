//! Integration tests for the attendance monitor

mod common;

use chrono::{NaiveDate, NaiveDateTime};
use common::{date, time, Fixture};

use rescue_roster::attendance::{
    attendance_overview, attendance_stats, delete_attendance, list_attendance, review_attendance,
};
use rescue_roster::error::SchedulingError;
use rescue_roster::models::{AttendanceFilter, AttendanceReview, AttendanceStatus, AttendanceUpdate};
use rescue_roster::shifts::update_attendance;

fn today() -> NaiveDate {
    date(2026, 11, 20)
}

fn at(d: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    d.and_time(time(h, m))
}

fn record(
    fx: &Fixture,
    volunteer_id: i64,
    day: NaiveDate,
    status: AttendanceStatus,
    check_in: NaiveDateTime,
    check_out: Option<NaiveDateTime>,
) -> i64 {
    let shift_id = fx.shift(volunteer_id, day);
    let update = AttendanceUpdate {
        attendance_status: status,
        check_in: Some(check_in),
        check_out,
        attendance_notes: None,
    };
    fx.db
        .transaction(|tx| update_attendance(tx, fx.admin.id, shift_id, &update))
        .expect("Failed to record attendance");
    shift_id
}

/// Three logs inside the default window and one older log
fn seeded() -> (Fixture, [i64; 4]) {
    let fx = Fixture::new();
    let d10 = date(2026, 11, 10);
    let d12 = date(2026, 11, 12);
    let d14 = date(2026, 11, 14);
    let old = date(2026, 9, 1);

    let present = record(&fx, fx.alice.id, d10, AttendanceStatus::Present, at(d10, 6, 0), Some(at(d10, 14, 0)));
    let late = record(&fx, fx.bob.id, d12, AttendanceStatus::Late, at(d12, 6, 30), Some(at(d12, 14, 0)));
    let absent = record(&fx, fx.erin.id, d14, AttendanceStatus::Absent, at(d14, 6, 0), None);
    let earlier = record(&fx, fx.alice.id, old, AttendanceStatus::Present, at(old, 6, 0), Some(at(old, 14, 0)));

    (fx, [present, late, absent, earlier])
}

fn shift_ids(records: &[rescue_roster::models::AttendanceRecord]) -> Vec<i64> {
    records.iter().map(|r| r.shift_id).collect()
}

#[test]
fn test_list_attendance_defaults_to_last_thirty_days() {
    let (fx, [present, late, absent, _]) = seeded();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let records = list_attendance(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to list attendance");
    assert_eq!(shift_ids(&records), vec![absent, late, present]);

    let alice = &records[2];
    assert_eq!(alice.volunteer_name.as_deref(), Some("Alice Moreno"));
    assert_eq!(alice.unit_name.as_deref(), Some("Engine 7"));
    assert_eq!(alice.total_hours, Some(8.0));
    assert_eq!(alice.start_time, time(6, 0));
    assert!(alice.verified_by_name.is_none());
    assert!(records[0].total_hours.is_none());
}

#[test]
fn test_list_attendance_filters() {
    let (fx, [present, late, _, earlier]) = seeded();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let by_volunteer = AttendanceFilter {
        volunteer_id: Some(fx.alice.id),
        date_from: Some(date(2026, 8, 1)),
        ..AttendanceFilter::default()
    };
    let records = list_attendance(&conn, &by_volunteer, today()).expect("Failed to list attendance");
    assert_eq!(shift_ids(&records), vec![present, earlier]);

    let by_status = AttendanceFilter {
        status: Some(AttendanceStatus::Late),
        ..AttendanceFilter::default()
    };
    let records = list_attendance(&conn, &by_status, today()).expect("Failed to list attendance");
    assert_eq!(shift_ids(&records), vec![late]);

    let empty_window = AttendanceFilter {
        date_from: Some(date(2026, 11, 15)),
        date_to: Some(date(2026, 11, 19)),
        ..AttendanceFilter::default()
    };
    let records = list_attendance(&conn, &empty_window, today()).expect("Failed to list attendance");
    assert!(records.is_empty());
}

#[test]
fn test_attendance_stats_cover_the_window() {
    let (fx, _) = seeded();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let stats = attendance_stats(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to load stats");
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.present, 1);
    assert_eq!(stats.late, 1);
    assert_eq!(stats.absent, 1);
    assert_eq!(stats.unique_volunteers, 3);
    assert!((stats.total_hours_worked - 15.5).abs() < 1e-9);
    assert!((stats.avg_hours_per_shift - 7.75).abs() < 1e-9);
    assert!((stats.attendance_rate - 66.7).abs() < 1e-9);
    assert!((stats.present_percent - 33.3).abs() < 1e-9);
    assert!((stats.absent_percent - 33.3).abs() < 1e-9);
    assert!(stats.excused_percent.abs() < f64::EPSILON);

    // Volunteer and status filters leave the totals alone
    let narrowed = AttendanceFilter {
        volunteer_id: Some(fx.bob.id),
        status: Some(AttendanceStatus::Late),
        ..AttendanceFilter::default()
    };
    let same = attendance_stats(&conn, &narrowed, today()).expect("Failed to load stats");
    assert_eq!(same, stats);
}

#[test]
fn test_empty_window_has_zero_rates() {
    let fx = Fixture::new();
    let conn = fx.db.get_connection().expect("Failed to get connection");
    let stats = attendance_stats(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to load stats");
    assert_eq!(stats.total_records, 0);
    assert!(stats.attendance_rate.abs() < f64::EPSILON);
    assert!(stats.avg_hours_per_shift.abs() < f64::EPSILON);
}

#[test]
fn test_staff_shift_logs_are_listed_and_counted() {
    let (fx, [present, late, absent, _]) = seeded();
    let day = date(2026, 11, 16);
    let staff_shift = {
        let conn = fx.db.get_connection().expect("Failed to get connection");
        conn.execute(
            "INSERT INTO shifts (user_id, shift_for, shift_type, shift_date, start_time, end_time)
             VALUES (?, 'user', 'morning', ?, ?, ?)",
            rusqlite::params![fx.employee.id, day, time(6, 0), time(14, 0)],
        )
        .expect("Failed to insert staff shift");
        conn.last_insert_rowid()
    };
    let update = AttendanceUpdate {
        attendance_status: AttendanceStatus::Present,
        check_in: Some(at(day, 6, 0)),
        check_out: Some(at(day, 13, 0)),
        attendance_notes: None,
    };
    fx.db
        .transaction(|tx| update_attendance(tx, fx.admin.id, staff_shift, &update))
        .expect("Failed to record attendance");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let records = list_attendance(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to list attendance");
    assert_eq!(shift_ids(&records), vec![staff_shift, absent, late, present]);
    assert_eq!(records[0].volunteer_id, None);
    assert_eq!(records[0].volunteer_name.as_deref(), Some("Eli Park"));

    let stats = attendance_stats(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to load stats");
    assert_eq!(stats.total_records, records.len() as i64);
}

#[test]
fn test_overview_lists_approved_volunteers() {
    let (fx, _) = seeded();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let overview = attendance_overview(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to load overview");
    assert_eq!(overview.records.len(), 3);
    assert_eq!(overview.stats.total_records, 3);
    let names: Vec<_> = overview.volunteers.iter().map(|v| v.first_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Dave", "Erin"]);
}

fn attendance_id(fx: &Fixture, shift_id: i64) -> i64 {
    let conn = fx.db.get_connection().expect("Failed to get connection");
    list_attendance(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to list attendance")
        .into_iter()
        .find(|r| r.shift_id == shift_id)
        .map(|r| r.attendance_id)
        .expect("attendance record exists")
}

#[test]
fn test_review_attendance_marks_verified() {
    let (fx, [_, late, _, _]) = seeded();
    let id = attendance_id(&fx, late);

    let review = AttendanceReview {
        attendance_status: AttendanceStatus::Excused,
        notes: Some("Traffic accident on route".to_string()),
        total_hours: Some(7.5),
        overtime_hours: Some(0.5),
    };
    let message = fx
        .db
        .transaction(|tx| review_attendance(tx, fx.admin.id, id, &review))
        .expect("Failed to review attendance");
    assert_eq!(message, "Attendance record updated successfully!");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let records = list_attendance(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to list attendance");
    let reviewed = records
        .iter()
        .find(|r| r.attendance_id == id)
        .expect("reviewed record");
    assert_eq!(reviewed.attendance_status, AttendanceStatus::Excused);
    assert_eq!(reviewed.notes.as_deref(), Some("Traffic accident on route"));
    assert_eq!(reviewed.overtime_hours, Some(0.5));
    assert_eq!(reviewed.verified_by_name.as_deref(), Some("Dana Reyes"));
    assert!(reviewed.verified_at.is_some());
}

#[test]
fn test_review_attendance_rejects_bad_input() {
    let (fx, [present, ..]) = seeded();
    let id = attendance_id(&fx, present);
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let review = AttendanceReview {
        attendance_status: AttendanceStatus::Present,
        notes: None,
        total_hours: None,
        overtime_hours: None,
    };
    let err = review_attendance(&conn, fx.admin.id, 0, &review).expect_err("missing id");
    assert_eq!(err.user_message(), "Missing required parameters.");

    let err = review_attendance(&conn, fx.admin.id, 9999, &review).expect_err("unknown id");
    assert!(matches!(err, SchedulingError::NotFound(_)));
    assert_eq!(err.user_message(), "Attendance record not found");

    let too_long = AttendanceReview {
        total_hours: Some(25.0),
        ..review.clone()
    };
    let err = review_attendance(&conn, fx.admin.id, id, &too_long).expect_err("hours out of range");
    assert_eq!(err.user_message(), "Total hours must be between 0 and 24");

    let negative = AttendanceReview {
        overtime_hours: Some(-1.0),
        ..review
    };
    let err = review_attendance(&conn, fx.admin.id, id, &negative).expect_err("negative overtime");
    assert_eq!(err.user_message(), "Overtime hours must be between 0 and 24");
}

#[test]
fn test_delete_attendance() {
    let (fx, [present, ..]) = seeded();
    let id = attendance_id(&fx, present);
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let err = delete_attendance(&conn, 0).expect_err("missing id");
    assert_eq!(err.user_message(), "Missing attendance ID.");

    let message = delete_attendance(&conn, id).expect("Failed to delete attendance");
    assert_eq!(message, "Attendance record deleted successfully!");

    let err = delete_attendance(&conn, id).expect_err("already deleted");
    assert!(matches!(err, SchedulingError::NotFound(_)));

    let records = list_attendance(&conn, &AttendanceFilter::default(), today())
        .expect("Failed to list attendance");
    assert_eq!(records.len(), 2);
}
