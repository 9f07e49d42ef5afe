use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::extract::{Json, Query};
use super::{done, ok, today, ApiResult, AppState, Empty};
use crate::auth::AdminContext;
use crate::confirmations::ConfirmationBoard;
use crate::models::{
    deserialize_text, ConfirmationFilter, ConfirmationStatus, DutyFilter, DutyPage, ReplacementCandidate,
};

/// Actions on the confirmation board
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum ConfirmationAction {
    UpdateConfirmation {
        shift_id: i64,
        confirmation_status: ConfirmationStatus,
        #[serde(default, deserialize_with = "deserialize_text")]
        admin_notes: Option<String>,
    },
    AssignReplacement {
        shift_id: i64,
        replacement_volunteer_id: i64,
    },
    SendReminder {
        shift_id: i64,
        #[serde(default)]
        volunteer_id: Option<i64>,
    },
}

#[derive(Debug, Deserialize)]
pub(super) struct ReplacementQuery {
    shift_id: i64,
    #[serde(default)]
    exclude: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct Replacements {
    volunteers: Vec<ReplacementCandidate>,
}

pub(super) async fn board(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(filter): Query<ConfirmationFilter>,
) -> ApiResult<ConfirmationBoard> {
    ok(state.repository.confirmation_board(filter, today()).await?)
}

pub(super) async fn act(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(action): Json<ConfirmationAction>,
) -> ApiResult<Empty> {
    let repo = &state.repository;
    let message = match action {
        ConfirmationAction::UpdateConfirmation {
            shift_id,
            confirmation_status,
            admin_notes,
        } => {
            repo.update_confirmation(admin.user_id, shift_id, confirmation_status, admin_notes)
                .await?
        }
        ConfirmationAction::AssignReplacement {
            shift_id,
            replacement_volunteer_id,
        } => {
            repo.assign_replacement(admin.user_id, shift_id, replacement_volunteer_id)
                .await?
        }
        ConfirmationAction::SendReminder { shift_id, volunteer_id } => {
            repo.send_reminder(shift_id, volunteer_id).await?
        }
    };
    done(message)
}

pub(super) async fn replacements(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(query): Query<ReplacementQuery>,
) -> ApiResult<Replacements> {
    let volunteers = state
        .repository
        .find_replacements(query.shift_id, query.exclude, today())
        .await?;
    ok(Replacements { volunteers })
}

pub(super) async fn duty_assignments(
    State(state): State<AppState>,
    _admin: AdminContext,
    Query(filter): Query<DutyFilter>,
) -> ApiResult<DutyPage> {
    ok(state.repository.duty_assignments(filter).await?)
}
