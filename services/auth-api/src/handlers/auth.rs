//! Session handlers (signup, login, reissue, logout)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use latch_auth_core::AuthError;

use crate::cookie::{expired_renewal_cookie, renewal_cookie};
use crate::error::{ApiError, ApiResult};
use crate::extractors::RenewalCookie;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub principal_id: i64,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct ReissueResponse {
    pub access_token: String,
}

/// Unwrap a JSON body, reporting syntax and shape errors in the API error format
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(payload)?;

    let principal = state
        .sessions
        .signup(&req.email, &req.password, &req.name)
        .await?;

    let location = format!("/api/users/{}", principal.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(SignupResponse {
            id: principal.id,
            email: principal.email,
            name: principal.name,
        }),
    ))
}

/// POST /api/auth/login
///
/// Returns the access token in the body and the renewal token as an HttpOnly cookie
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(payload)?;

    let pair = state.sessions.login(&req.email, &req.password).await?;

    let cookie = renewal_cookie(
        &pair.renewal_token,
        state.config.auth.renewal_token_ttl,
        state.config.refresh_cookie_secure,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            principal_id: pair.principal_id.0,
            access_token: pair.access_token,
        }),
    ))
}

/// POST /api/auth/reissue
///
/// Rotates the renewal cookie and returns a fresh access token
pub async fn reissue(
    State(state): State<AppState>,
    RenewalCookie(presented): RenewalCookie,
) -> ApiResult<impl IntoResponse> {
    let presented = presented.ok_or(AuthError::Unauthenticated)?;

    let pair = state.sessions.reissue(&presented).await?;

    let cookie = renewal_cookie(
        &pair.renewal_token,
        state.config.auth.renewal_token_ttl,
        state.config.refresh_cookie_secure,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ReissueResponse {
            access_token: pair.access_token,
        }),
    ))
}

/// POST /api/auth/logout
///
/// Always succeeds and always clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    RenewalCookie(presented): RenewalCookie,
) -> impl IntoResponse {
    if let Some(presented) = presented {
        state.sessions.logout(&presented).await;
    }

    (
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            expired_renewal_cookie(state.config.refresh_cookie_secure),
        )],
    )
}
