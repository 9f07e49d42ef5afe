use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::extract::{Json, Query};
use super::{done, ok, today, ApiResult, AppState, Empty};
use crate::auth::AdminContext;
use crate::models::{AttendanceUpdate, ShiftDetail, ShiftFilter, ShiftUpdate};
use crate::shifts::ShiftOverview;

#[derive(Debug, Deserialize)]
pub(super) struct DetailQuery {
    id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct ShiftPayload {
    shift: ShiftDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateShiftRequest {
    shift_id: i64,
    #[serde(flatten)]
    update: ShiftUpdate,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateAttendanceRequest {
    shift_id: i64,
    #[serde(flatten)]
    update: AttendanceUpdate,
}

#[derive(Debug, Deserialize)]
pub(super) struct CancelRequest {
    shift_id: i64,
}

pub(super) async fn list(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(filter): Query<ShiftFilter>,
) -> ApiResult<ShiftOverview> {
    ok(state.repository.shift_overview(filter, today()).await?)
}

pub(super) async fn details(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(query): Query<DetailQuery>,
) -> ApiResult<ShiftPayload> {
    let shift = state.repository.shift_details(query.id).await?;
    ok(ShiftPayload { shift })
}

pub(super) async fn update(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(request): Json<UpdateShiftRequest>,
) -> ApiResult<Empty> {
    done(
        state
            .repository
            .update_shift(admin.user_id, request.shift_id, request.update)
            .await?,
    )
}

pub(super) async fn update_attendance(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(request): Json<UpdateAttendanceRequest>,
) -> ApiResult<Empty> {
    done(
        state
            .repository
            .update_attendance(admin.user_id, request.shift_id, request.update)
            .await?,
    )
}

pub(super) async fn cancel(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Empty> {
    done(state.repository.cancel_shift(admin.user_id, request.shift_id).await?)
}
