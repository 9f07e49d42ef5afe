//! Shared fixture for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::params;
use tempfile::TempDir;

use rescue_roster::config::SchedulingConfig;
use rescue_roster::db::Database;
use rescue_roster::models::{
    NewSingleShift, NewUnit, NewUser, NewVolunteer, ShiftType, Unit, User, UserRole, Volunteer,
};
use rescue_roster::repository::SqliteRepository;
use rescue_roster::scheduling;

/// A seeded database: one admin, one employee, two units and five volunteers.
///
/// - `alice`: approved, Active, linked to a user account, has a phone number
/// - `bob`: approved, Active, no account
/// - `carol`: application still pending
/// - `dave`: approved but Inactive
/// - `erin`: approved, New Volunteer, no account
pub struct Fixture {
    pub db: Arc<Database>,
    pub admin: User,
    pub employee: User,
    pub alice_user: User,
    pub engine: Unit,
    pub rescue: Unit,
    pub alice: Volunteer,
    pub bob: Volunteer,
    pub carol: Volunteer,
    pub dave: Volunteer,
    pub erin: Volunteer,
    _dir: Option<TempDir>,
}

impl Fixture {
    /// Fixture backed by a database file in a temporary directory
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let url = format!("sqlite://{}", dir.path().join("roster.db").display());
        let db = Database::new(&url).expect("Failed to create database");
        Self::seed(db, Some(dir))
    }

    /// Fixture backed by a private in-memory database
    pub fn in_memory() -> Self {
        let db = Database::in_memory().expect("Failed to create in-memory database");
        Self::seed(db, None)
    }

    fn seed(db: Database, dir: Option<TempDir>) -> Self {
        let admin = db
            .create_user(&new_user("Dana", "Reyes", "dana@station.test", UserRole::Admin))
            .expect("Failed to create admin");
        let employee = db
            .create_user(&new_user("Eli", "Park", "eli@station.test", UserRole::Employee))
            .expect("Failed to create employee");
        let alice_user = db
            .create_user(&new_user("Alice", "Moreno", "alice@example.com", UserRole::User))
            .expect("Failed to create volunteer account");

        let engine = db
            .create_unit(&NewUnit {
                unit_name: "Engine 7".to_string(),
                unit_code: "E7".to_string(),
                unit_type: "Fire".to_string(),
                location: Some("Station 7".to_string()),
            })
            .expect("Failed to create unit");
        let rescue = db
            .create_unit(&NewUnit {
                unit_name: "Rescue 2".to_string(),
                unit_code: "R2".to_string(),
                unit_type: "Rescue".to_string(),
                location: None,
            })
            .expect("Failed to create unit");

        let alice = db
            .create_volunteer(&NewVolunteer {
                user_id: Some(alice_user.id),
                email: Some("alice@example.com".to_string()),
                contact_number: Some("555-0101".to_string()),
                skills: vec!["first_aid_cpr".to_string(), "driving".to_string()],
                ..volunteer("Alice", "Moreno", "approved", "Active")
            })
            .expect("Failed to create volunteer");
        let bob = db
            .create_volunteer(&NewVolunteer {
                contact_number: Some("555-0102".to_string()),
                ..volunteer("Bob", "Tanaka", "approved", "Active")
            })
            .expect("Failed to create volunteer");
        let carol = db
            .create_volunteer(&volunteer("Carol", "Singh", "pending", "New Volunteer"))
            .expect("Failed to create volunteer");
        let dave = db
            .create_volunteer(&volunteer("Dave", "Olsen", "approved", "Inactive"))
            .expect("Failed to create volunteer");
        let erin = db
            .create_volunteer(&volunteer("Erin", "Walsh", "approved", "New Volunteer"))
            .expect("Failed to create volunteer");

        Self {
            db: Arc::new(db),
            admin,
            employee,
            alice_user,
            engine,
            rescue,
            alice,
            bob,
            carol,
            dave,
            erin,
            _dir: dir,
        }
    }

    /// Async repository over the fixture database
    pub fn repository(&self) -> SqliteRepository {
        SqliteRepository::new(Arc::clone(&self.db), settings())
    }

    /// Create one morning shift and return its id
    pub fn shift(&self, volunteer_id: i64, date: NaiveDate) -> i64 {
        self.shift_with(NewSingleShift {
            volunteer_id: Some(volunteer_id),
            shift_date: date,
            shift_type: ShiftType::Morning,
            unit_id: Some(self.engine.id),
            ..NewSingleShift::default()
        })
    }

    /// Create a shift from a full form and return its id
    pub fn shift_with(&self, form: NewSingleShift) -> i64 {
        let created = self
            .db
            .transaction(|tx| scheduling::create_single_shift(tx, &settings(), self.admin.id, &form))
            .expect("Failed to create shift");
        created.shift_ids[0]
    }

    /// Rows in a table
    pub fn count(&self, table: &str) -> i64 {
        let conn = self.db.get_connection().expect("Failed to get connection");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("Failed to count rows")
    }

    /// Record that a volunteer joined a unit
    pub fn assign(&self, volunteer_id: i64, unit_id: i64, on: NaiveDate) {
        self.db
            .assign_volunteer_to_unit(volunteer_id, unit_id, on)
            .expect("Failed to assign volunteer");
    }

    /// Mark a shift's stored confirmation directly
    pub fn set_confirmation(&self, shift_id: i64, status: &str) {
        let conn = self.db.get_connection().expect("Failed to get connection");
        conn.execute(
            "UPDATE shifts SET confirmation_status = ? WHERE id = ?",
            params![status, shift_id],
        )
        .expect("Failed to set confirmation");
    }
}

pub fn settings() -> SchedulingConfig {
    SchedulingConfig::default()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn new_user(first: &str, last: &str, email: &str, role: UserRole) -> NewUser {
    NewUser {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        role,
    }
}

fn volunteer(first: &str, last: &str, status: &str, volunteer_status: &str) -> NewVolunteer {
    NewVolunteer {
        first_name: first.to_string(),
        last_name: last.to_string(),
        status: status.to_string(),
        volunteer_status: volunteer_status.to_string(),
        ..NewVolunteer::default()
    }
}
