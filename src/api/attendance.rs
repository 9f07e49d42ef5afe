use axum::extract::State;
use serde::Deserialize;

use super::extract::{Json, Query};
use super::{done, ok, today, ApiResult, AppState, Empty};
use crate::attendance::AttendanceOverview;
use crate::auth::{AdminContext, StaffContext};
use crate::models::{AttendanceFilter, AttendanceReview};

/// Corrections on the attendance monitor
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum AttendanceAction {
    Review {
        attendance_id: i64,
        #[serde(flatten)]
        review: AttendanceReview,
    },
    Delete {
        attendance_id: i64,
    },
}

pub(super) async fn monitor(
    State(state): State<AppState>,
    _staff: StaffContext,
    Query(filter): Query<AttendanceFilter>,
) -> ApiResult<AttendanceOverview> {
    ok(state.repository.attendance_overview(filter, today()).await?)
}

pub(super) async fn act(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(action): Json<AttendanceAction>,
) -> ApiResult<Empty> {
    let message = match action {
        AttendanceAction::Review { attendance_id, review } => {
            state
                .repository
                .review_attendance(admin.user_id, attendance_id, review)
                .await?
        }
        AttendanceAction::Delete { attendance_id } => state.repository.delete_attendance(attendance_id).await?,
    };
    done(message)
}
