//! Principal-scoped handlers; every route requires a Bearer access token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::cookie::expired_renewal_cookie;
use crate::error::ApiResult;
use crate::extractors::AuthPrincipal;
use crate::handlers::auth::json_body;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub password: String,
}

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthPrincipal,
) -> ApiResult<Json<MeResponse>> {
    let principal = state.sessions.principal(auth.principal_id).await?;

    Ok(Json(MeResponse {
        id: principal.id,
        email: principal.email,
        name: principal.name,
    }))
}

/// PATCH /api/users/me/password
///
/// Revokes the renewal credential; the client logs in again with the new password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthPrincipal,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(payload)?;

    state
        .sessions
        .change_credential(
            auth.principal_id,
            &req.current_password,
            &req.new_password,
            &req.new_password_confirm,
        )
        .await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            expired_renewal_cookie(state.config.refresh_cookie_secure),
        )],
    ))
}

/// DELETE /api/users/me
pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthPrincipal,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(payload)?;

    state
        .sessions
        .withdraw(auth.principal_id, &req.password)
        .await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            expired_renewal_cookie(state.config.refresh_cookie_secure),
        )],
    ))
}
