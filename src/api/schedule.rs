use axum::extract::State;
use serde::Deserialize;

use super::extract::Json;
use super::{ok, today, ApiResult, AppState};
use crate::auth::AdminContext;
use crate::models::{CreatedShifts, NewBulkShifts, NewRecurringShifts, NewSingleShift};
use crate::scheduling::SchedulePage;

/// Form submitted to the create-schedule page
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum CreateAction {
    CreateSingleShift(NewSingleShift),
    CreateRecurringShifts(NewRecurringShifts),
    CreateBulkShifts(NewBulkShifts),
}

pub(super) async fn page(State(state): State<AppState>, _admin: AdminContext) -> ApiResult<SchedulePage> {
    ok(state.repository.schedule_page(today()).await?)
}

pub(super) async fn create(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(action): Json<CreateAction>,
) -> ApiResult<CreatedShifts> {
    let repo = &state.repository;
    let created = match action {
        CreateAction::CreateSingleShift(form) => repo.create_single_shift(admin.user_id, form).await?,
        CreateAction::CreateRecurringShifts(form) => repo.create_recurring_shifts(admin.user_id, form).await?,
        CreateAction::CreateBulkShifts(form) => repo.create_bulk_shifts(admin.user_id, form).await?,
    };
    ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tag_selects_form() {
        let action: CreateAction = serde_json::from_str(
            r#"{"action":"create_bulk_shifts","volunteer_ids":[1,2],"shift_date":"2026-11-02",
                "start_time":"08:00:00","end_time":"16:00:00"}"#,
        )
        .expect("Failed to parse action");
        match action {
            CreateAction::CreateBulkShifts(form) => assert_eq!(form.volunteer_ids, vec![1, 2]),
            other => panic!("unexpected action {other:?}"),
        }
    }
}
