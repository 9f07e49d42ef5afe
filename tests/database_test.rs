mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{date, Fixture};
use rescue_roster::db::{self, Database};
use rescue_roster::error::SchedulingError;
use rescue_roster::models::{NewUnit, NewUser, ShiftStatus, UserRole};
use rescue_roster::shifts;

#[test]
fn test_database_creation_and_initialization() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("nested").join("roster.db");
    let db_url = format!("sqlite://{}", db_path.display());

    // Test database creation
    let db = Database::new(&db_url).expect("Failed to create database");
    assert!(db_path.exists());

    // Migrations can run again on an initialized database
    db.migrate().expect("Failed to re-run migrations");

    let _conn = db.get_connection().expect("Failed to get database connection");
    assert!(db.pool_size() >= 1);
}

#[test]
fn test_unsupported_database_url() {
    let err = Database::new("postgres://localhost/roster").expect_err("only sqlite is supported");
    assert!(matches!(err, SchedulingError::Config(_)));
}

#[test]
fn test_user_and_session_management() {
    let db = Database::in_memory().expect("Failed to create database");
    let user = db
        .create_user(&NewUser {
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            email: "dana@station.test".to_string(),
            role: UserRole::Admin,
        })
        .expect("Failed to create user");
    assert_eq!(user.full_name(), "Dana Reyes");
    assert_eq!(
        db.get_user(user.id).expect("Failed to get user").map(|u| u.role),
        Some(UserRole::Admin)
    );

    let token = db.create_session(user.id, 12).expect("Failed to create session");
    let signed_in = db
        .user_for_session(&token)
        .expect("Failed to look up session")
        .expect("session is valid");
    assert_eq!(signed_in.id, user.id);

    assert!(db
        .user_for_session("no-such-token")
        .expect("Failed to look up session")
        .is_none());

    let duplicate = db.create_user(&NewUser {
        first_name: "Dana".to_string(),
        last_name: "Again".to_string(),
        email: "dana@station.test".to_string(),
        role: UserRole::Employee,
    });
    assert!(duplicate.is_err());
}

#[test]
fn test_units_and_volunteer_listings() {
    let fx = Fixture::new();
    let conn = fx.db.get_connection().expect("Failed to get connection");

    let units = db::list_active_units(&conn).expect("Failed to list units");
    assert_eq!(units.len(), 2);
    assert!(db::find_unit(&conn, fx.rescue.id)
        .expect("Failed to find unit")
        .is_some());

    let active: Vec<_> = db::list_active_volunteers(&conn)
        .expect("Failed to list volunteers")
        .into_iter()
        .map(|v| v.last_name)
        .collect();
    assert_eq!(active, vec!["Moreno", "Tanaka", "Walsh"]);

    let approved: Vec<_> = db::list_approved_volunteers(&conn)
        .expect("Failed to list volunteers")
        .into_iter()
        .map(|v| v.first_name)
        .collect();
    assert_eq!(approved, vec!["Alice", "Bob", "Dave", "Erin"]);
}

#[test]
fn test_volunteer_shows_latest_unit() {
    let fx = Fixture::new();
    fx.assign(fx.bob.id, fx.engine.id, date(2026, 3, 1));
    fx.assign(fx.bob.id, fx.rescue.id, date(2026, 9, 1));

    let bob = fx
        .db
        .get_volunteer(fx.bob.id)
        .expect("Failed to get volunteer")
        .expect("volunteer exists");
    assert_eq!(bob.unit_code.as_deref(), Some("R2"));

    let alice = fx
        .db
        .get_volunteer(fx.alice.id)
        .expect("Failed to get volunteer")
        .expect("volunteer exists");
    assert_eq!(alice.skills, vec!["first_aid_cpr".to_string(), "driving".to_string()]);
    assert!(alice.unit_name.is_none());
}

#[test]
fn test_unit_codes_are_unique() {
    let fx = Fixture::new();
    let duplicate = fx.db.create_unit(&NewUnit {
        unit_name: "Engine Seven Reserve".to_string(),
        unit_code: "E7".to_string(),
        unit_type: "Fire".to_string(),
        location: None,
    });
    assert!(matches!(duplicate, Err(SchedulingError::Database(_))));
}

#[test]
fn test_notifications_newest_first() {
    let fx = Fixture::new();
    let conn = fx.db.get_connection().expect("Failed to get connection");
    db::notify(&conn, fx.admin.id, "first", "First", "one", None).expect("Failed to notify");
    db::notify(&conn, fx.admin.id, "second", "Second", "two", Some(7)).expect("Failed to notify");
    drop(conn);

    let notices = fx
        .db
        .notifications_for_user(fx.admin.id)
        .expect("Failed to load notifications");
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].kind, "second");
    assert_eq!(notices[0].related_id, Some(7));
    assert!(!notices[1].is_read);
}

#[test]
fn test_concurrent_writers_wait_for_each_other() {
    let fx = Fixture::new();
    let first = fx.shift(fx.alice.id, date(2026, 11, 3));
    let second = fx.shift(fx.bob.id, date(2026, 11, 4));
    let admin_id = fx.admin.id;
    let barrier = Arc::new(Barrier::new(2));

    let writers: Vec<_> = [first, second]
        .into_iter()
        .map(|shift_id| {
            let db = Arc::clone(&fx.db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.transaction(|tx| {
                    shifts::load_state(tx, shift_id)?;
                    thread::sleep(Duration::from_millis(50));
                    shifts::cancel_shift(tx, admin_id, shift_id)
                })
            })
        })
        .collect();

    for writer in writers {
        let (_, changed) = writer
            .join()
            .expect("Writer thread panicked")
            .expect("Failed to cancel shift");
        assert!(changed);
    }

    let conn = fx.db.get_connection().expect("Failed to get connection");
    for shift_id in [first, second] {
        let (_, state) = shifts::load_state(&conn, shift_id).expect("Failed to load shift");
        assert_eq!(state.status, ShiftStatus::Cancelled);
    }
}
