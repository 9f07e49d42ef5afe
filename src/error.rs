//! Error types for the rescue-roster library.
//!
//! Every fallible operation returns [`SchedulingError`]. Each variant knows the
//! text that is safe to show an administrator; database, pool and IO detail
//! stays in the logs.

use thiserror::Error;

use crate::models::{ConfirmationStatus, ShiftStatus};

/// Errors that can occur while scheduling, confirming or tracking shifts.
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Rejected input, message is shown to the user as-is
    #[error("{0}")]
    Validation(String),

    /// A referenced row does not exist
    #[error("{0}")]
    NotFound(String),

    /// A status change the shift lifecycle does not allow
    #[error("Cannot change shift from {from_status}/{from_confirmation} to {to_status}/{to_confirmation}")]
    Transition {
        /// Current shift status
        from_status: ShiftStatus,
        /// Current confirmation status
        from_confirmation: ConfirmationStatus,
        /// Requested shift status
        to_status: ShiftStatus,
        /// Requested confirmation status
        to_confirmation: ConfirmationStatus,
    },

    /// No valid session
    #[error("Unauthorized")]
    Unauthorized,

    /// Session user is not an administrator
    #[error("Access denied")]
    Forbidden,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking database task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

/// Convenience type alias for Result with SchedulingError
pub type Result<T> = std::result::Result<T, SchedulingError>;

impl SchedulingError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a missing row.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether the error is an internal failure whose detail must not be shown.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Pool(_) | Self::Config(_) | Self::Io(_) | Self::TaskJoin(_)
        )
    }

    /// Text that is safe to return to the client.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_internal() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Pool(_) => "pool",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Transition { .. } => "transition",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::TaskJoin(_) => "task_join",
        }
    }
}

impl From<tokio::task::JoinError> for SchedulingError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskJoin(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_masked() {
        let err = SchedulingError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_internal());
        assert_eq!(err.user_message(), "An internal error occurred");
        assert!(err.to_string().contains("Query returned no rows"));
    }

    #[test]
    fn test_domain_errors_are_shown() {
        let err = SchedulingError::validation("Invalid shift ID");
        assert_eq!(err.user_message(), "Invalid shift ID");
        assert_eq!(SchedulingError::Forbidden.user_message(), "Access denied");
        assert_eq!(SchedulingError::Unauthorized.user_message(), "Unauthorized");
    }

    #[test]
    fn test_transition_message() {
        let err = SchedulingError::Transition {
            from_status: ShiftStatus::Completed,
            from_confirmation: ConfirmationStatus::Confirmed,
            to_status: ShiftStatus::Cancelled,
            to_confirmation: ConfirmationStatus::Declined,
        };
        assert_eq!(err.kind(), "transition");
        assert_eq!(
            err.user_message(),
            "Cannot change shift from completed/confirmed to cancelled/declined"
        );
    }
}
