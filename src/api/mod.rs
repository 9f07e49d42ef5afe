//! JSON HTTP API
//!
//! Every response is an object with a `success` flag, an optional `message`
//! and the payload fields flattened beside them.

use std::sync::Arc;

use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::SchedulingError;
use crate::metrics::MetricsCollector;
use crate::repository::SchedulingRepository;

mod attendance;
mod confirmations;
mod extract;
mod schedule;
mod shifts;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn SchedulingRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn SchedulingRepository>) -> Self {
        Self { repository }
    }
}

/// Error response carrying a [`SchedulingError`]
#[derive(Debug)]
pub struct ApiError(pub SchedulingError);

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            SchedulingError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulingError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulingError::Transition { .. } => StatusCode::CONFLICT,
            SchedulingError::Unauthorized => StatusCode::UNAUTHORIZED,
            SchedulingError::Forbidden => StatusCode::FORBIDDEN,
            SchedulingError::Database(_)
            | SchedulingError::Pool(_)
            | SchedulingError::Config(_)
            | SchedulingError::Io(_)
            | SchedulingError::TaskJoin(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        MetricsCollector::default().record_http_error(self.0.kind(), status.as_u16());

        if self.0.is_internal() {
            error!(error = %self.0, kind = self.0.kind(), "Request failed");
        } else {
            warn!(error = %self.0, kind = self.0.kind(), "Request rejected");
        }

        let body = ApiResponse {
            success: false,
            message: Some(self.0.user_message()),
            data: Empty {},
        };
        (status, Json(body)).into_response()
    }
}

/// Response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// Payload with no fields
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Result type for handlers
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Successful response with a payload
#[allow(clippy::unnecessary_wraps)]
fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        message: None,
        data,
    }))
}

/// Successful response with only a message
#[allow(clippy::unnecessary_wraps)]
fn done(message: String) -> ApiResult<Empty> {
    Ok(Json(ApiResponse {
        success: true,
        message: Some(message),
        data: Empty {},
    }))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<ApiResponse<Health>> {
    Json(ApiResponse {
        success: true,
        message: None,
        data: Health { status: "ok" },
    })
}

/// Routes without middleware
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/sm/create_schedule",
            get(schedule::page).post(schedule::create),
        )
        .route(
            "/api/sm/confirm_availability",
            get(confirmations::board).post(confirmations::act),
        )
        .route("/api/sm/replacements", get(confirmations::replacements))
        .route("/api/sm/duty_assignments", get(confirmations::duty_assignments))
        .route("/api/sm/view_shifts", get(shifts::list))
        .route("/api/sm/get_shift_details", get(shifts::details))
        .route("/api/sm/update_shift", post(shifts::update))
        .route("/api/sm/update_attendance", post(shifts::update_attendance))
        .route("/api/sm/cancel_shift", post(shifts::cancel))
        .route(
            "/api/sm/monitor_attendance",
            get(attendance::monitor).post(attendance::act),
        )
        .route("/health", get(health))
}

/// The full application with tracing and request ids
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Outermost last: the id is set before tracing sees the request
    routes()
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
