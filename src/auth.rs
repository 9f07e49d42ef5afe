//! Request-scoped authentication
//!
//! Handlers take [`AdminContext`] or [`StaffContext`] as an extractor. The
//! session token comes from an `Authorization: Bearer` header or the
//! `session_id` cookie and is resolved once per request; the result is cached
//! in the request extensions.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use serde::Serialize;
use tracing::warn;

use crate::api::{ApiError, AppState};
use crate::error::SchedulingError;
use crate::models::UserRole;

/// Cookie that carries the session token
pub const SESSION_COOKIE: &str = "session_id";

/// The signed-in user behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
}

/// An administrator; every scheduling endpoint requires one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminContext {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
}

/// An administrator or employee; allowed on the attendance monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffContext {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
}

/// Token from the bearer header, falling back to the session cookie
pub fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

async fn session_user(parts: &mut Parts, state: &AppState) -> Result<SessionUser, ApiError> {
    if let Some(user) = parts.extensions.get::<SessionUser>() {
        return Ok(user.clone());
    }

    let Some(token) = session_token(parts) else {
        warn!(uri = %parts.uri, "Request without session");
        return Err(SchedulingError::Unauthorized.into());
    };

    let user = state.repository.authenticate(&token).await?.ok_or_else(|| {
        warn!(uri = %parts.uri, "Unknown or expired session");
        SchedulingError::Unauthorized
    })?;

    let session = SessionUser {
        user_id: user.id,
        name: user.full_name(),
        role: user.role,
    };
    parts.extensions.insert(session.clone());
    Ok(session)
}

impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        if user.role != UserRole::Admin {
            warn!(user_id = user.user_id, role = %user.role, uri = %parts.uri, "Admin access denied");
            return Err(SchedulingError::Forbidden.into());
        }
        Ok(Self {
            user_id: user.user_id,
            name: user.name,
            role: user.role,
        })
    }
}

impl FromRequestParts<AppState> for StaffContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = session_user(parts, state).await?;
        if !matches!(user.role, UserRole::Admin | UserRole::Employee) {
            warn!(user_id = user.user_id, role = %user.role, uri = %parts.uri, "Staff access denied");
            return Err(SchedulingError::Forbidden.into());
        }
        Ok(Self {
            user_id: user.user_id,
            name: user.name,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("Failed to build request").into_parts().0
    }

    #[test]
    fn test_bearer_token_wins() {
        let parts = parts(
            Request::builder()
                .header(AUTHORIZATION, "Bearer abc123")
                .header(COOKIE, "session_id=cookie-token"),
        );
        assert_eq!(session_token(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_token() {
        let parts = parts(Request::builder().header(COOKIE, "theme=dark; session_id=xyz"));
        assert_eq!(session_token(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_token() {
        let parts = parts(Request::builder().header(AUTHORIZATION, "Basic dXNlcg=="));
        assert_eq!(session_token(&parts), None);
    }
}
