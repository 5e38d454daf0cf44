//! Axum extractors for authentication

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use std::convert::Infallible;

use latch_auth_core::AuthError;
use latch_types::PrincipalId;

use crate::cookie::RENEWAL_COOKIE;
use crate::error::ApiError;
use crate::state::AppState;

/// Principal resolved from a Bearer access token
#[derive(Debug, Clone, Copy)]
pub struct AuthPrincipal {
    pub principal_id: PrincipalId,
}

impl<S> FromRequestParts<S> for AuthPrincipal
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let principal_id = app_state.sessions.authenticate(token)?;

        Ok(AuthPrincipal { principal_id })
    }
}

/// Renewal token from the `refreshToken` cookie, if present
#[derive(Debug, Clone)]
pub struct RenewalCookie(pub Option<String>);

impl<S> FromRequestParts<S> for RenewalCookie
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RenewalCookie(cookie_value(&parts.headers, RENEWAL_COOKIE)))
    }
}

/// Extract the token from an `Authorization: Bearer` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Find a cookie by name across every `Cookie` header
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
