//! Shift lifecycle
//!
//! A shift carries two status fields: its lifecycle [`ShiftStatus`] and the
//! volunteer's [`ConfirmationStatus`]. [`ShiftState`] pairs them and is the
//! only place that decides which combinations an admin may move between.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};
use crate::models::{ConfirmationStatus, ShiftStatus};

/// The status pair of one shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftState {
    /// Lifecycle status
    pub status: ShiftStatus,
    /// Effective confirmation status
    pub confirmation: ConfirmationStatus,
}

impl ShiftState {
    /// State of a freshly created shift
    pub const NEW: Self = Self {
        status: ShiftStatus::Scheduled,
        confirmation: ConfirmationStatus::Pending,
    };

    /// Pair a status with a confirmation.
    #[must_use]
    pub const fn new(status: ShiftStatus, confirmation: ConfirmationStatus) -> Self {
        Self {
            status,
            confirmation,
        }
    }

    /// Whether a pair is allowed to exist at all.
    #[must_use]
    pub const fn is_consistent(self) -> bool {
        !matches!(self.status, ShiftStatus::Cancelled)
            || matches!(self.confirmation, ConfirmationStatus::Declined)
    }

    /// Move to `to`, rejecting changes the lifecycle does not allow.
    ///
    /// Reinstating a cancelled shift always resets the confirmation to
    /// pending, whatever confirmation was requested.
    pub fn transition(self, to: Self) -> Result<Self> {
        let to = if self.status == ShiftStatus::Cancelled && to.status == ShiftStatus::Scheduled {
            Self::NEW
        } else {
            to
        };

        if to == self {
            return Ok(self);
        }
        if !to.is_consistent() || !self.status_may_become(to.status) {
            return Err(self.rejected(to));
        }
        Ok(to)
    }

    /// Cancel the shift. Returns the new state and whether anything changed.
    pub fn cancel(self) -> Result<(Self, bool)> {
        let cancelled = Self::new(ShiftStatus::Cancelled, ConfirmationStatus::Declined);
        if self.status == ShiftStatus::Cancelled {
            return Ok((cancelled, self != cancelled));
        }
        self.transition(cancelled).map(|state| (state, true))
    }

    fn status_may_become(self, to: ShiftStatus) -> bool {
        use ShiftStatus::{Absent, Cancelled, Completed, Confirmed, Scheduled};

        match (self.status, to) {
            (from, to) if from == to => true,
            (Scheduled | Confirmed, _) => true,
            (Completed, Absent) | (Absent, Completed) => true,
            (Cancelled, Scheduled) => true,
            (Completed | Absent | Cancelled, _) => false,
        }
    }

    const fn rejected(self, to: Self) -> SchedulingError {
        SchedulingError::Transition {
            from_status: self.status,
            from_confirmation: self.confirmation,
            to_status: to.status,
            to_confirmation: to.confirmation,
        }
    }
}
