//! Rescue Roster - Volunteer Shift Scheduling
//!
//! Admin panel backend for a fire and rescue volunteer corps, served as a
//! JSON API over a SQLite database.
//!
//! # Features
//!
//! - Single, recurring and bulk shift creation with duty assignments
//! - Confirmation tracking with per-volunteer reliability
//! - Replacement search with conflict exclusion
//! - Shift listing, editing, attendance and cancellation
//! - Attendance monitoring and verification

/// JSON HTTP endpoints
pub mod api;
/// Attendance log listing and corrections
pub mod attendance;
/// Request-scoped session extractors
pub mod auth;
/// Configuration management
pub mod config;
/// Confirmation board and volunteer swaps
pub mod confirmations;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Shift status transitions
pub mod lifecycle;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Parameterized WHERE clause builder
pub mod query;
/// Replacement volunteer search
pub mod replacements;
/// Async data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Shift creation
pub mod scheduling;
/// Shift listing, editing and cancellation
pub mod shifts;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use api::{router, AppState};
pub use config::AppConfig;
pub use db::Database;
pub use error::{Result, SchedulingError};
pub use lifecycle::ShiftState;
pub use models::{ConfirmationStatus, ShiftStatus};
pub use repository::{SchedulingRepository, SqliteRepository};
