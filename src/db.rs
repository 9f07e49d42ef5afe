use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, SubsecRound, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{Result, SchedulingError};
use crate::models::{NewUnit, NewUser, NewVolunteer, Notification, Unit, User, Volunteer};
use crate::schema::{notifications, sessions, units, users, volunteer_assignments, volunteers};
use crate::validation::InputValidator;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const SESSION_TOKEN_LEN: usize = 48;

/// Volunteer columns plus the unit of the latest active assignment
const VOLUNTEER_SELECT: &str = "SELECT v.id, v.user_id, v.first_name, v.last_name, v.email,
        v.contact_number, v.status, v.volunteer_status,
        v.skills_basic_firefighting, v.skills_first_aid_cpr, v.skills_search_rescue,
        v.skills_driving, v.skills_communication, v.skills_mechanical, v.skills_logistics,
        u.unit_name, u.unit_code
    FROM volunteers v
    LEFT JOIN volunteer_assignments va ON va.id = (
        SELECT MAX(a.id) FROM volunteer_assignments a
        WHERE a.volunteer_id = v.id AND LOWER(a.status) = 'active'
    )
    LEFT JOIN units u ON u.id = va.unit_id";

/// Current UTC time truncated to whole seconds, the format every timestamp column uses
#[must_use]
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Database manager for handling connections and operations
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) a database file with default pool settings
    pub fn new(database_url: &str) -> Result<Self> {
        Self::from_config(&DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        })
    }

    /// Open (or create) the database described by the configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        InputValidator::validate_database_url(&config.url)?;
        let path = database_path(&config.url);

        if path == ":memory:" {
            return Self::in_memory();
        }

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build(manager)?;

        let db = Self { pool };
        db.migrate()?;
        info!(path, max_connections = config.max_connections, "Database ready");
        Ok(db)
    }

    /// A private in-memory database served by a single pooled connection
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        let pool = Pool::builder().max_size(1).build(manager)?;
        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    pub fn migrate(&self) -> Result<()> {
        let conn = self.get_connection()?;
        run_migrations(&conn)
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Connections currently open in the pool
    #[must_use]
    pub fn pool_size(&self) -> u32 {
        self.pool.state().connections
    }

    /// Run `f` inside a transaction, committing only when it returns `Ok`
    ///
    /// The write lock is taken at BEGIN, so concurrent writers queue on the
    /// busy timeout instead of failing when they upgrade from a read.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Add a user account
    pub fn create_user(&self, new_user: &NewUser) -> Result<User> {
        let conn = self.get_connection()?;
        insert_user(&conn, new_user)
    }

    /// Get a user by ID
    pub fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.get_connection()?;
        find_user(&conn, user_id)
    }

    /// Issue a session token for a user
    pub fn create_session(&self, user_id: i64, ttl_hours: u32) -> Result<String> {
        let conn = self.get_connection()?;
        insert_session(&conn, user_id, now(), ttl_hours)
    }

    /// Resolve an unexpired session token to its user
    pub fn user_for_session(&self, token: &str) -> Result<Option<User>> {
        let conn = self.get_connection()?;
        find_session_user(&conn, token, now())
    }

    /// Add a unit
    pub fn create_unit(&self, new_unit: &NewUnit) -> Result<Unit> {
        let conn = self.get_connection()?;
        insert_unit(&conn, new_unit)
    }

    /// Add a volunteer
    pub fn create_volunteer(&self, new_volunteer: &NewVolunteer) -> Result<Volunteer> {
        let conn = self.get_connection()?;
        insert_volunteer(&conn, new_volunteer)
    }

    /// Get a volunteer by ID
    pub fn get_volunteer(&self, volunteer_id: i64) -> Result<Option<Volunteer>> {
        let conn = self.get_connection()?;
        find_volunteer(&conn, volunteer_id)
    }

    /// Record that a volunteer serves with a unit
    pub fn assign_volunteer_to_unit(
        &self,
        volunteer_id: i64,
        unit_id: i64,
        assignment_date: NaiveDate,
    ) -> Result<i64> {
        let conn = self.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, 'active')",
                volunteer_assignments::TABLE,
                volunteer_assignments::VOLUNTEER_ID,
                volunteer_assignments::UNIT_ID,
                volunteer_assignments::ASSIGNMENT_DATE,
                volunteer_assignments::STATUS
            ),
            params![volunteer_id, unit_id, assignment_date],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Notifications for a user, newest first
    pub fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let conn = self.get_connection()?;
        list_notifications(&conn, user_id)
    }
}

fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    // Readers keep going while a writer holds the lock
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
}

/// Strip the `sqlite:` / `sqlite://` prefix from a database URL
#[must_use]
pub fn database_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!(
        "../migrations/2026-10-01-000000_create_scheduling_tables/up.sql"
    ))?;
    debug!("Migrations applied");
    Ok(())
}

/// Map a row from the users table
pub fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(users::ID)?,
        first_name: row.get(users::FIRST_NAME)?,
        last_name: row.get(users::LAST_NAME)?,
        email: row.get(users::EMAIL)?,
        role: row.get(users::ROLE)?,
        avatar: row.get(users::AVATAR)?,
    })
}

/// Map a row produced by [`VOLUNTEER_SELECT`]
fn map_volunteer(row: &Row<'_>) -> rusqlite::Result<Volunteer> {
    Ok(Volunteer {
        id: row.get(volunteers::ID)?,
        user_id: row.get(volunteers::USER_ID)?,
        first_name: row.get(volunteers::FIRST_NAME)?,
        last_name: row.get(volunteers::LAST_NAME)?,
        email: row.get(volunteers::EMAIL)?,
        contact_number: row.get(volunteers::CONTACT_NUMBER)?,
        status: row.get(volunteers::STATUS)?,
        volunteer_status: row.get(volunteers::VOLUNTEER_STATUS)?,
        skills: read_skills(row)?,
        unit_name: row.get(units::UNIT_NAME)?,
        unit_code: row.get(units::UNIT_CODE)?,
    })
}

/// Names of the skill flags set on a row that selects every skill column
pub fn read_skills(row: &Row<'_>) -> rusqlite::Result<Vec<String>> {
    let mut skills = Vec::new();
    for column in volunteers::SKILLS {
        if row.get::<_, bool>(column)? {
            skills.push(column.trim_start_matches("skills_").to_string());
        }
    }
    Ok(skills)
}

fn map_unit(row: &Row<'_>) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: row.get(units::ID)?,
        unit_name: row.get(units::UNIT_NAME)?,
        unit_code: row.get(units::UNIT_CODE)?,
        unit_type: row.get(units::UNIT_TYPE)?,
        location: row.get(units::LOCATION)?,
        status: row.get(units::STATUS)?,
    })
}

/// Insert a user row
pub fn insert_user(conn: &Connection, new_user: &NewUser) -> Result<User> {
    InputValidator::validate_name(&new_user.first_name)?;
    InputValidator::validate_name(&new_user.last_name)?;
    InputValidator::validate_email(&new_user.email)?;

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
            users::TABLE,
            users::FIRST_NAME,
            users::LAST_NAME,
            users::EMAIL,
            users::ROLE
        ),
        params![
            InputValidator::sanitize_text(&new_user.first_name),
            InputValidator::sanitize_text(&new_user.last_name),
            new_user.email.trim(),
            new_user.role
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_user(conn, id)?.ok_or_else(|| SchedulingError::not_found("User not found"))
}

/// Look up a user by ID
pub fn find_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT * FROM {} WHERE {} = ?", users::TABLE, users::ID),
            params![user_id],
            map_user,
        )
        .optional()?;
    Ok(user)
}

/// Create a session valid for `ttl_hours` from `issued_at`
pub fn insert_session(
    conn: &Connection,
    user_id: i64,
    issued_at: NaiveDateTime,
    ttl_hours: u32,
) -> Result<String> {
    if find_user(conn, user_id)?.is_none() {
        return Err(SchedulingError::not_found("User not found"));
    }

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect();
    let expires_at = issued_at + chrono::Duration::hours(i64::from(ttl_hours));

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
            sessions::TABLE,
            sessions::TOKEN,
            sessions::USER_ID,
            sessions::CREATED_AT,
            sessions::EXPIRES_AT
        ),
        params![token, user_id, issued_at, expires_at],
    )?;

    Ok(token)
}

/// Resolve a session token that has not expired at `at`
pub fn find_session_user(conn: &Connection, token: &str, at: NaiveDateTime) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!(
                "SELECT u.* FROM {s} s JOIN {u} u ON u.{uid} = s.{suid}
                 WHERE s.{token} = ? AND s.{expires} > ?",
                s = sessions::TABLE,
                u = users::TABLE,
                uid = users::ID,
                suid = sessions::USER_ID,
                token = sessions::TOKEN,
                expires = sessions::EXPIRES_AT
            ),
            params![token, at],
            map_user,
        )
        .optional()?;
    Ok(user)
}

/// Insert a unit row
pub fn insert_unit(conn: &Connection, new_unit: &NewUnit) -> Result<Unit> {
    InputValidator::validate_name(&new_unit.unit_name)?;
    if new_unit.unit_code.trim().is_empty() {
        return Err(SchedulingError::validation("Unit code cannot be empty"));
    }

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, 'Active')",
            units::TABLE,
            units::UNIT_NAME,
            units::UNIT_CODE,
            units::UNIT_TYPE,
            units::LOCATION,
            units::STATUS
        ),
        params![
            new_unit.unit_name.trim(),
            new_unit.unit_code.trim(),
            new_unit.unit_type.trim(),
            new_unit.location
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_unit(conn, id)?.ok_or_else(|| SchedulingError::not_found("Unit not found"))
}

/// Look up a unit by ID
pub fn find_unit(conn: &Connection, unit_id: i64) -> Result<Option<Unit>> {
    let unit = conn
        .query_row(
            &format!("SELECT * FROM {} WHERE {} = ?", units::TABLE, units::ID),
            params![unit_id],
            map_unit,
        )
        .optional()?;
    Ok(unit)
}

/// Units with status Active, by name
pub fn list_active_units(conn: &Connection) -> Result<Vec<Unit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} WHERE {} = 'Active' ORDER BY {}",
        units::TABLE,
        units::STATUS,
        units::UNIT_NAME
    ))?;
    let rows = stmt.query_map([], map_unit)?;

    let mut results = Vec::new();
    for unit in rows {
        results.push(unit?);
    }
    Ok(results)
}

/// Every unit, by name
pub fn list_units(conn: &Connection) -> Result<Vec<Unit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} ORDER BY {}",
        units::TABLE,
        units::UNIT_NAME
    ))?;
    let rows = stmt.query_map([], map_unit)?;

    let mut results = Vec::new();
    for unit in rows {
        results.push(unit?);
    }
    Ok(results)
}

/// Insert a volunteer row
pub fn insert_volunteer(conn: &Connection, new_volunteer: &NewVolunteer) -> Result<Volunteer> {
    InputValidator::validate_name(&new_volunteer.first_name)?;
    InputValidator::validate_name(&new_volunteer.last_name)?;
    if let Some(email) = &new_volunteer.email {
        InputValidator::validate_email(email)?;
    }
    if let Some(phone) = &new_volunteer.contact_number {
        InputValidator::validate_phone(phone)?;
    }

    let mut skill_flags = [false; volunteers::SKILLS.len()];
    for skill in &new_volunteer.skills {
        let column = volunteers::SKILLS
            .iter()
            .position(|c| *c == skill.as_str() || c.trim_start_matches("skills_") == skill.as_str())
            .ok_or_else(|| SchedulingError::validation(format!("Unknown skill: {skill}")))?;
        skill_flags[column] = true;
    }

    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            volunteers::TABLE,
            volunteers::USER_ID,
            volunteers::FIRST_NAME,
            volunteers::LAST_NAME,
            volunteers::EMAIL,
            volunteers::CONTACT_NUMBER,
            volunteers::STATUS,
            volunteers::VOLUNTEER_STATUS,
            volunteers::SKILLS.join(", ")
        ),
        params![
            new_volunteer.user_id,
            InputValidator::sanitize_text(&new_volunteer.first_name),
            InputValidator::sanitize_text(&new_volunteer.last_name),
            new_volunteer.email,
            new_volunteer.contact_number,
            new_volunteer.status,
            new_volunteer.volunteer_status,
            skill_flags[0],
            skill_flags[1],
            skill_flags[2],
            skill_flags[3],
            skill_flags[4],
            skill_flags[5],
            skill_flags[6]
        ],
    )?;

    let id = conn.last_insert_rowid();
    find_volunteer(conn, id)?.ok_or_else(|| SchedulingError::not_found("Volunteer not found"))
}

/// Look up a volunteer by ID
pub fn find_volunteer(conn: &Connection, volunteer_id: i64) -> Result<Option<Volunteer>> {
    let volunteer = conn
        .query_row(
            &format!("{VOLUNTEER_SELECT} WHERE v.{} = ?", volunteers::ID),
            params![volunteer_id],
            map_volunteer,
        )
        .optional()?;
    Ok(volunteer)
}

/// Approved volunteers who are Active or New, by last then first name
pub fn list_active_volunteers(conn: &Connection) -> Result<Vec<Volunteer>> {
    let mut stmt = conn.prepare(&format!(
        "{VOLUNTEER_SELECT}
         WHERE v.{status} = 'approved' AND v.{vstatus} IN ('Active', 'New Volunteer')
         ORDER BY v.{last}, v.{first}",
        status = volunteers::STATUS,
        vstatus = volunteers::VOLUNTEER_STATUS,
        last = volunteers::LAST_NAME,
        first = volunteers::FIRST_NAME
    ))?;
    let rows = stmt.query_map([], map_volunteer)?;

    let mut results = Vec::new();
    for volunteer in rows {
        results.push(volunteer?);
    }
    Ok(results)
}

/// Approved volunteers regardless of service status, by first then last name
pub fn list_approved_volunteers(conn: &Connection) -> Result<Vec<Volunteer>> {
    let mut stmt = conn.prepare(&format!(
        "{VOLUNTEER_SELECT} WHERE v.{status} = 'approved' ORDER BY v.{first}, v.{last}",
        status = volunteers::STATUS,
        first = volunteers::FIRST_NAME,
        last = volunteers::LAST_NAME
    ))?;
    let rows = stmt.query_map([], map_volunteer)?;

    let mut results = Vec::new();
    for volunteer in rows {
        results.push(volunteer?);
    }
    Ok(results)
}

/// Insert an in-app notification
pub fn notify(
    conn: &Connection,
    user_id: i64,
    kind: &str,
    title: &str,
    message: &str,
    related_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, 'shift', ?)",
            notifications::TABLE,
            notifications::USER_ID,
            notifications::KIND,
            notifications::TITLE,
            notifications::MESSAGE,
            notifications::RELATED_ID,
            notifications::RELATED_TYPE,
            notifications::CREATED_AT
        ),
        params![user_id, kind, title, message, related_id, now()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Notifications for a user, newest first
pub fn list_notifications(conn: &Connection, user_id: i64) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} WHERE {} = ? ORDER BY {} DESC",
        notifications::TABLE,
        notifications::USER_ID,
        notifications::ID
    ))?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(Notification {
            id: row.get(notifications::ID)?,
            user_id: row.get(notifications::USER_ID)?,
            kind: row.get(notifications::KIND)?,
            title: row.get(notifications::TITLE)?,
            message: row.get(notifications::MESSAGE)?,
            related_id: row.get(notifications::RELATED_ID)?,
            is_read: row.get(notifications::IS_READ)?,
            created_at: row.get(notifications::CREATED_AT)?,
        })
    })?;

    let mut results = Vec::new();
    for notification in rows {
        results.push(notification?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[test]
    fn test_database_path_prefixes() {
        assert_eq!(database_path("sqlite://data/roster.db"), "data/roster.db");
        assert_eq!(database_path("sqlite:data/roster.db"), "data/roster.db");
        assert_eq!(database_path("roster.db"), "roster.db");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::in_memory().expect("Failed to open database");
        let result: Result<()> = db.transaction(|tx| {
            insert_user(
                tx,
                &NewUser {
                    first_name: "Ada".to_string(),
                    last_name: "Admin".to_string(),
                    email: "ada@example.com".to_string(),
                    role: UserRole::Admin,
                },
            )?;
            Err(SchedulingError::validation("abort"))
        });
        assert!(result.is_err());

        let conn = db.get_connection().expect("Failed to get connection");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .expect("Failed to count users");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let db = Database::in_memory().expect("Failed to open database");
        let conn = db.get_connection().expect("Failed to get connection");
        let user = insert_user(
            &conn,
            &NewUser {
                first_name: "Ada".to_string(),
                last_name: "Admin".to_string(),
                email: "ada@example.com".to_string(),
                role: UserRole::Admin,
            },
        )
        .expect("Failed to insert user");

        let issued = now() - chrono::Duration::hours(3);
        let token = insert_session(&conn, user.id, issued, 2).expect("Failed to create session");
        assert_eq!(token.len(), SESSION_TOKEN_LEN);
        assert!(find_session_user(&conn, &token, now())
            .expect("Failed to look up session")
            .is_none());
        assert!(find_session_user(&conn, &token, issued)
            .expect("Failed to look up session")
            .is_some());
    }
}
