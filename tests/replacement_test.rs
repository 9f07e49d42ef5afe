//! Integration tests for the replacement search

mod common;

use common::{date, Fixture};
use proptest::prelude::*;

use rescue_roster::error::SchedulingError;
use rescue_roster::models::{NewVolunteer, Volunteer};
use rescue_roster::replacements::find_replacements;

const LOOKBACK: u32 = 30;
const LIMIT: u32 = 10;

fn today() -> chrono::NaiveDate {
    date(2026, 11, 5)
}

fn extra_volunteer(fx: &Fixture, first: &str, last: &str) -> Volunteer {
    fx.db
        .create_volunteer(&NewVolunteer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            status: "approved".to_string(),
            volunteer_status: "Active".to_string(),
            ..NewVolunteer::default()
        })
        .expect("Failed to create volunteer")
}

fn candidate_ids(fx: &Fixture, shift_id: i64, exclude: Option<i64>) -> Vec<i64> {
    let conn = fx.db.get_connection().expect("Failed to get connection");
    find_replacements(&conn, shift_id, exclude, today(), LOOKBACK, LIMIT)
        .expect("Failed to search replacements")
        .iter()
        .map(|c| c.volunteer_id)
        .collect()
}

#[test]
fn test_excludes_current_busy_and_unavailable_volunteers() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 10));
    fx.shift(fx.erin.id, date(2026, 11, 10));

    assert_eq!(candidate_ids(&fx, shift_id, None), vec![fx.bob.id]);
}

#[test]
fn test_cancelled_shift_still_blocks_the_day() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 10));
    let erin_shift = fx.shift(fx.erin.id, date(2026, 11, 10));
    fx.db
        .transaction(|tx| rescue_roster::shifts::cancel_shift(tx, fx.admin.id, erin_shift))
        .expect("Failed to cancel shift");

    assert_eq!(candidate_ids(&fx, shift_id, None), vec![fx.bob.id]);
}

#[test]
fn test_orders_by_recent_confirmations_then_assignment() {
    let fx = Fixture::new();
    let frank = extra_volunteer(&fx, "Frank", "Ibarra");
    let gina = extra_volunteer(&fx, "Gina", "Holt");
    fx.assign(frank.id, fx.engine.id, date(2026, 6, 1));
    fx.assign(gina.id, fx.rescue.id, date(2026, 9, 1));

    for day in [20, 21] {
        let id = fx.shift(fx.bob.id, date(2026, 10, day));
        fx.set_confirmation(id, "confirmed");
    }
    let erin_confirmed = fx.shift(fx.erin.id, date(2026, 10, 22));
    fx.set_confirmation(erin_confirmed, "confirmed");
    let old = fx.shift(frank.id, date(2026, 8, 1));
    fx.set_confirmation(old, "confirmed");

    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 10));

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let candidates = find_replacements(&conn, shift_id, None, today(), LOOKBACK, LIMIT)
        .expect("Failed to search replacements");

    let ids: Vec<_> = candidates.iter().map(|c| c.volunteer_id).collect();
    assert_eq!(ids, vec![fx.bob.id, fx.erin.id, gina.id, frank.id]);
    assert_eq!(candidates[0].confirmed_past_month, 2);
    assert_eq!(candidates[1].confirmed_past_month, 1);
    assert_eq!(candidates[3].confirmed_past_month, 0);
    assert_eq!(candidates[2].unit_name.as_deref(), Some("Rescue 2"));
    assert_eq!(candidates[2].assignment_date, Some(date(2026, 9, 1)));

    let limited = find_replacements(&conn, shift_id, None, today(), LOOKBACK, 2)
        .expect("Failed to search replacements");
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_explicit_exclude_replaces_default() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.alice.id, date(2026, 11, 10));

    // Alice stays out because her own shift occupies the day
    assert_eq!(candidate_ids(&fx, shift_id, Some(fx.bob.id)), vec![fx.erin.id]);
}

#[test]
fn test_candidate_carries_skills_and_contact() {
    let fx = Fixture::new();
    let shift_id = fx.shift(fx.bob.id, date(2026, 11, 10));
    fx.shift(fx.erin.id, date(2026, 11, 10));

    let conn = fx.db.get_connection().expect("Failed to get connection");
    let candidates = find_replacements(&conn, shift_id, None, today(), LOOKBACK, LIMIT)
        .expect("Failed to search replacements");

    assert_eq!(candidates.len(), 1);
    let alice = &candidates[0];
    assert_eq!(alice.volunteer_id, fx.alice.id);
    assert_eq!(alice.skills, vec!["first_aid_cpr".to_string(), "driving".to_string()]);
    assert_eq!(alice.contact_number.as_deref(), Some("555-0101"));
    assert_eq!(alice.volunteer_status, "Active");
}

#[test]
fn test_unknown_and_invalid_shift() {
    let fx = Fixture::new();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let err = find_replacements(&conn, 777, None, today(), LOOKBACK, LIMIT).expect_err("unknown shift");
    assert!(matches!(err, SchedulingError::NotFound(_)));

    let err = find_replacements(&conn, -3, None, today(), LOOKBACK, LIMIT).expect_err("invalid shift");
    assert_eq!(err.user_message(), "Invalid shift ID");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_busy_volunteers_never_offered(bob_busy in any::<bool>(), erin_busy in any::<bool>(), day in 1u32..28) {
        let fx = Fixture::in_memory();
        let shift_date = date(2026, 12, day);
        let shift_id = fx.shift(fx.alice.id, shift_date);
        if bob_busy {
            fx.shift(fx.bob.id, shift_date);
        }
        if erin_busy {
            fx.shift(fx.erin.id, shift_date);
        }

        let ids = candidate_ids(&fx, shift_id, None);

        prop_assert_eq!(ids.contains(&fx.bob.id), !bob_busy);
        prop_assert_eq!(ids.contains(&fx.erin.id), !erin_busy);
        prop_assert!(!ids.contains(&fx.alice.id));
        prop_assert!(!ids.contains(&fx.carol.id));
        prop_assert!(!ids.contains(&fx.dave.id));
    }
}
