//! Integration tests for the confirmation board, swaps and reminders

mod common;

use common::{date, Fixture};
use rusqlite::params;

use rescue_roster::confirmations::{
    assign_replacement, confirmation_board, list_confirmations, list_duty_assignments, send_reminder,
    update_confirmation, volunteer_stats,
};
use rescue_roster::error::SchedulingError;
use rescue_roster::models::{
    ConfirmationFilter, ConfirmationStatus, DutyFilter, DutyInput, NewSingleShift, ReliabilityTier,
    ShiftStatus, ShiftType, ShiftUpdate,
};
use rescue_roster::shifts::{cancel_shift, find_shift, update_shift};

const WINDOW: u32 = 30;

fn today() -> chrono::NaiveDate {
    date(2026, 11, 1)
}

#[test]
fn test_board_orders_declined_first() {
    let fx = Fixture::new();
    let pending = fx.shift(fx.alice.id, date(2026, 11, 3));
    let declined = fx.shift(fx.bob.id, date(2026, 11, 4));
    let confirmed = fx.shift(fx.erin.id, date(2026, 11, 5));
    fx.shift(fx.carol.id, date(2026, 11, 6));
    fx.shift(fx.alice.id, date(2026, 12, 25));
    fx.set_confirmation(declined, "declined");
    fx.set_confirmation(confirmed, "confirmed");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let board = confirmation_board(&conn, &ConfirmationFilter::default(), today(), WINDOW)
        .expect("Failed to load board");

    let order: Vec<_> = board.confirmations.iter().map(|r| r.shift_id).collect();
    assert_eq!(order, vec![declined, pending, confirmed]);
    assert_eq!(board.summary.total, 3);
    assert_eq!(board.summary.declined, 1);
    assert_eq!(board.summary.pending, 1);
    assert_eq!(board.summary.confirmed, 1);
    assert_eq!(board.summary.change_requested, 0);
    assert_eq!(board.units.len(), 2);
    assert_eq!(board.confirmations[0].volunteer_name, "Bob Tanaka");
    assert_eq!(board.confirmations[0].unit_code.as_deref(), Some("E7"));
}

#[test]
fn test_board_filters() {
    let fx = Fixture::new();
    let pending = fx.shift(fx.alice.id, date(2026, 11, 3));
    let confirmed = fx.shift(fx.bob.id, date(2026, 11, 4));
    let later = fx.shift(fx.bob.id, date(2026, 12, 25));
    fx.set_confirmation(confirmed, "confirmed");

    let conn = fx.db.get_connection().expect("Failed to get connection");

    let by_status = ConfirmationFilter {
        status: Some(ConfirmationStatus::Pending),
        ..ConfirmationFilter::default()
    };
    let rows = list_confirmations(&conn, &by_status, today(), WINDOW).expect("Failed to filter");
    assert_eq!(rows.iter().map(|r| r.shift_id).collect::<Vec<_>>(), vec![pending]);

    let by_date = ConfirmationFilter {
        date: Some(date(2026, 12, 25)),
        ..ConfirmationFilter::default()
    };
    let rows = list_confirmations(&conn, &by_date, today(), WINDOW).expect("Failed to filter");
    assert_eq!(rows.iter().map(|r| r.shift_id).collect::<Vec<_>>(), vec![later]);

    let by_unit = ConfirmationFilter {
        unit: Some(fx.rescue.id),
        ..ConfirmationFilter::default()
    };
    let rows = list_confirmations(&conn, &by_unit, today(), WINDOW).expect("Failed to filter");
    assert!(rows.is_empty());
}

#[test]
fn test_response_row_fills_missing_confirmation() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));

    let conn = fx.db.get_connection().expect("Failed to get connection");
    conn.execute(
        "UPDATE shifts SET confirmation_status = NULL WHERE id = ?",
        params![shift_id],
    )
    .expect("Failed to clear confirmation");
    conn.execute(
        "INSERT INTO shift_confirmations (shift_id, volunteer_id, status, notes, responded_at)
         VALUES (?, ?, 'confirmed', 'See you there', '2026-11-01 09:00:00')",
        params![shift_id, fx.alice.id],
    )
    .expect("Failed to insert response");

    let rows = list_confirmations(&conn, &ConfirmationFilter::default(), today(), WINDOW)
        .expect("Failed to load board");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].confirmation_status, None);
    assert_eq!(rows[0].actual_status, ConfirmationStatus::Confirmed);
    assert_eq!(rows[0].response_notes.as_deref(), Some("See you there"));
}

#[test]
fn test_update_confirmation_logs_change() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));

    let message = fx
        .db
        .transaction(|tx| update_confirmation(tx, fx.admin.id, shift_id, ConfirmationStatus::Confirmed, None))
        .expect("Failed to update confirmation");
    assert_eq!(message, "Confirmation status updated successfully!");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let shift = find_shift(&conn, shift_id)
        .expect("Failed to load shift")
        .expect("shift exists");
    assert_eq!(shift.status, ShiftStatus::Scheduled);
    assert_eq!(shift.confirmation_status, Some(ConfirmationStatus::Confirmed));
    assert!(shift.confirmed_at.is_some());

    let (request_type, details, reviewed_by): (String, String, i64) = conn
        .query_row(
            "SELECT request_type, request_details, reviewed_by FROM shift_change_requests WHERE shift_id = ?",
            params![shift_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("Failed to load change log");
    assert_eq!(request_type, "other");
    assert_eq!(details, "Admin updated confirmation status to: confirmed");
    assert_eq!(reviewed_by, fx.admin.id);
}

#[test]
fn test_reconfirming_stamps_a_fresh_time() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));
    let confirm = |status: ConfirmationStatus| {
        fx.db
            .transaction(|tx| update_confirmation(tx, fx.admin.id, shift_id, status, None))
            .expect("Failed to update confirmation");
    };
    let confirmed_at = || {
        let conn = fx.db.get_connection().expect("Failed to get connection");
        find_shift(&conn, shift_id)
            .expect("Failed to load shift")
            .expect("shift exists")
            .confirmed_at
    };

    confirm(ConfirmationStatus::Confirmed);
    let stale = date(2026, 1, 1).and_hms_opt(8, 0, 0).expect("valid time");
    {
        let conn = fx.db.get_connection().expect("Failed to get connection");
        conn.execute(
            "UPDATE shifts SET confirmed_at = ? WHERE id = ?",
            params![stale, shift_id],
        )
        .expect("Failed to backdate confirmation");
    }

    // Editing a confirmed shift keeps its confirmation time
    fx.db
        .transaction(|tx| {
            update_shift(
                tx,
                fx.admin.id,
                shift_id,
                &ShiftUpdate {
                    status: Some(ShiftStatus::Confirmed),
                    confirmation_status: Some(ConfirmationStatus::Confirmed),
                    notes: None,
                },
            )
        })
        .expect("Failed to update shift");
    assert_eq!(confirmed_at(), Some(stale));

    confirm(ConfirmationStatus::Pending);
    assert_eq!(confirmed_at(), None);

    confirm(ConfirmationStatus::Confirmed);
    let fresh = confirmed_at().expect("confirmation time is set");
    assert!(fresh > stale);
}

#[test]
fn test_update_confirmation_keeps_admin_notes() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));

    fx.db
        .transaction(|tx| {
            update_confirmation(
                tx,
                fx.admin.id,
                shift_id,
                ConfirmationStatus::ChangeRequested,
                Some("Asked to move to the evening"),
            )
        })
        .expect("Failed to update confirmation");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let details: String = conn
        .query_row(
            "SELECT request_details FROM shift_change_requests WHERE shift_id = ?",
            params![shift_id],
            |row| row.get(0),
        )
        .expect("Failed to load change log");
    assert_eq!(details, "Asked to move to the evening");
}

#[test]
fn test_update_confirmation_rejects_cancelled_shift() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));
    fx.db
        .transaction(|tx| cancel_shift(tx, fx.admin.id, shift_id))
        .expect("Failed to cancel shift");

    let err = fx
        .db
        .transaction(|tx| update_confirmation(tx, fx.admin.id, shift_id, ConfirmationStatus::Confirmed, None))
        .expect_err("cancelled shift cannot be confirmed");
    assert!(matches!(err, SchedulingError::Transition { .. }));
    assert_eq!(fx.count("shift_change_requests"), 0);
}

#[test]
fn test_update_confirmation_unknown_shift() {
    let fx = Fixture::new();
    let err = fx
        .db
        .transaction(|tx| update_confirmation(tx, fx.admin.id, 4242, ConfirmationStatus::Confirmed, None))
        .expect_err("unknown shift");
    assert_eq!(err.user_message(), "Shift not found");

    let err = fx
        .db
        .transaction(|tx| update_confirmation(tx, fx.admin.id, 0, ConfirmationStatus::Confirmed, None))
        .expect_err("invalid shift id");
    assert_eq!(err.user_message(), "Invalid shift ID");
}

#[test]
fn test_volunteer_stats_tiers() {
    let fx = Fixture::new();
    for day in 1..=5 {
        let id = fx.shift(fx.alice.id, date(2026, 10, day));
        if day <= 4 {
            fx.set_confirmation(id, "confirmed");
        }
    }
    for day in 1..=3 {
        let id = fx.shift(fx.bob.id, date(2026, 10, day));
        if day <= 2 {
            fx.set_confirmation(id, "confirmed");
        }
    }
    let declined = fx.shift(fx.erin.id, date(2026, 10, 9));
    fx.set_confirmation(declined, "declined");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let stats = volunteer_stats(&conn).expect("Failed to load stats");

    let ids: Vec<_> = stats.iter().map(|s| s.volunteer_id).collect();
    assert_eq!(ids, vec![fx.alice.id, fx.bob.id, fx.erin.id]);

    assert_eq!(stats[0].total_shifts, 5);
    assert_eq!(stats[0].confirmed, 4);
    assert_eq!(stats[0].pending, 1);
    assert!((stats[0].confirmation_rate - 80.0).abs() < 1e-9);
    assert_eq!(stats[0].reliability, ReliabilityTier::High);
    assert_eq!(stats[0].first_shift_date, Some(date(2026, 10, 1)));
    assert_eq!(stats[0].last_shift_date, Some(date(2026, 10, 5)));

    assert_eq!(stats[1].reliability, ReliabilityTier::Medium);
    assert_eq!(stats[2].declined, 1);
    assert_eq!(stats[2].reliability, ReliabilityTier::Low);
}

#[test]
fn test_assign_replacement_moves_shift() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));
    fx.db
        .transaction(|tx| {
            update_shift(
                tx,
                fx.admin.id,
                shift_id,
                &ShiftUpdate {
                    status: Some(ShiftStatus::Confirmed),
                    confirmation_status: Some(ConfirmationStatus::Confirmed),
                    notes: None,
                },
            )
        })
        .expect("Failed to confirm shift");

    let message = fx
        .db
        .transaction(|tx| assign_replacement(tx, fx.admin.id, shift_id, fx.bob.id))
        .expect("Failed to assign replacement");
    assert_eq!(message, "Volunteer replaced successfully!");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let shift = find_shift(&conn, shift_id)
        .expect("Failed to load shift")
        .expect("shift exists");
    assert_eq!(shift.volunteer_id, Some(fx.bob.id));
    assert_eq!(shift.user_id, None);
    assert_eq!(shift.status, ShiftStatus::Scheduled);
    assert_eq!(shift.confirmation_status, Some(ConfirmationStatus::Pending));
    assert_eq!(shift.confirmed_at, None);

    let (request_type, details, volunteer_id): (String, String, i64) = conn
        .query_row(
            "SELECT request_type, request_details, volunteer_id FROM shift_change_requests
             WHERE shift_id = ? AND request_type = 'swap'",
            params![shift_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("Failed to load swap log");
    assert_eq!(request_type, "swap");
    assert_eq!(
        details,
        format!(
            "Admin reassigned shift from volunteer ID {} to volunteer ID {}",
            fx.alice.id, fx.bob.id
        )
    );
    assert_eq!(volunteer_id, fx.bob.id);
}

#[test]
fn test_assign_replacement_notifies_linked_account() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.bob.id, date(2026, 11, 3));

    fx.db
        .transaction(|tx| assign_replacement(tx, fx.admin.id, shift_id, fx.alice.id))
        .expect("Failed to assign replacement");

    let notices = fx
        .db
        .notifications_for_user(fx.alice_user.id)
        .expect("Failed to load notifications");
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, "shift_reassigned");
    assert_eq!(
        notices[0].message,
        "You have been assigned a shift on Nov 03, 2026 from 6:00 AM to 2:00 PM. Please confirm your availability."
    );

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let shift = find_shift(&conn, shift_id)
        .expect("Failed to load shift")
        .expect("shift exists");
    assert_eq!(shift.user_id, Some(fx.alice_user.id));
}

#[test]
fn test_assign_replacement_rejections() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));
    fx.shift(fx.erin.id, date(2026, 11, 3));

    let reject = |volunteer_id: i64| {
        fx.db
            .transaction(|tx| assign_replacement(tx, fx.admin.id, shift_id, volunteer_id))
            .expect_err("replacement must be rejected")
    };

    assert_eq!(
        reject(fx.alice.id).user_message(),
        "The replacement must be a different volunteer"
    );
    let err = reject(9999);
    assert!(matches!(err, SchedulingError::NotFound(_)));
    assert_eq!(err.user_message(), "Volunteer not found");
    assert_eq!(reject(fx.carol.id).user_message(), "Volunteer is not approved");
    assert_eq!(
        reject(fx.erin.id).user_message(),
        "Erin Walsh already has a shift on 2026-11-03"
    );

    fx.db
        .transaction(|tx| cancel_shift(tx, fx.admin.id, shift_id))
        .expect("Failed to cancel shift");
    assert_eq!(
        reject(fx.bob.id).user_message(),
        "Cannot assign a replacement to a cancelled shift"
    );
    assert_eq!(fx.count("shift_change_requests"), 0);
}

#[test]
fn test_send_reminder_logs_sms() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 3));

    let message = fx
        .db
        .transaction(|tx| send_reminder(tx, shift_id, Some(fx.alice.id)))
        .expect("Failed to send reminder");
    assert_eq!(message, "Reminder sent to Alice Moreno!");

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let (recipient, text, status): (String, String, String) = conn
        .query_row("SELECT recipient, message, status FROM sms_logs", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .expect("Failed to load sms log");
    assert_eq!(recipient, "555-0101");
    assert_eq!(
        text,
        "Reminder: You have a shift on 2026-11-03 at 06:00:00 - Main Station. Please confirm your availability."
    );
    assert_eq!(status, "sent");
}

#[test]
fn test_send_reminder_failures() {
    let fx = Fixture::new();
    let alice_shift = fx.shift(fx.alice.id, date(2026, 11, 3));
    let erin_shift = fx.shift(fx.erin.id, date(2026, 11, 3));

    let err = fx
        .db
        .transaction(|tx| send_reminder(tx, alice_shift, Some(fx.bob.id)))
        .expect_err("volunteer does not match the shift");
    assert_eq!(
        err.user_message(),
        "Could not send reminder - volunteer information not found."
    );

    let err = fx
        .db
        .transaction(|tx| send_reminder(tx, erin_shift, None))
        .expect_err("volunteer has no phone");
    assert_eq!(
        err.user_message(),
        "Could not send reminder - volunteer has no contact number."
    );
    assert_eq!(fx.count("sms_logs"), 0);
}

#[test]
fn test_duty_assignments_are_paged() {
    let fx = Fixture::new();
    let mut shift_ids = Vec::new();
    for day in 1..=7 {
        shift_ids.push(fx.shift_with(NewSingleShift {
            volunteer_id: Some(fx.alice.id),
            shift_date: date(2026, 11, day),
            shift_type: ShiftType::Morning,
            duty: Some(DutyInput::default()),
            ..NewSingleShift::default()
        }));
    }
    fx.shift(fx.bob.id, date(2026, 11, 1));

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let first = list_duty_assignments(&conn, &DutyFilter::default(), 5).expect("Failed to list duties");
    assert_eq!(first.total, 7);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.page, 1);
    assert_eq!(first.duties.len(), 5);
    assert_eq!(first.duties[0].duty.shift_id, shift_ids[6]);
    assert_eq!(first.duties[0].volunteer_name.as_deref(), Some("Alice Moreno"));

    let second = list_duty_assignments(
        &conn,
        &DutyFilter {
            page: Some(2),
            ..DutyFilter::default()
        },
        5,
    )
    .expect("Failed to list duties");
    assert_eq!(second.duties.len(), 2);
    assert_eq!(second.duties[1].duty.shift_id, shift_ids[0]);

    let one = list_duty_assignments(
        &conn,
        &DutyFilter {
            shift_id: Some(shift_ids[3]),
            ..DutyFilter::default()
        },
        5,
    )
    .expect("Failed to list duties");
    assert_eq!(one.total, 1);
    assert_eq!(one.total_pages, 1);
}
