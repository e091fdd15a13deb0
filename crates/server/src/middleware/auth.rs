use crate::api::ApiError;
use crate::config::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use employee_mcp_core::auth::{parse_bearer, ValidatedToken};
use std::sync::Arc;

/// Extract the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_bearer(value)
}

/// Validate the request's bearer token, if it carries one
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Option<ValidatedToken> {
    let Some(token) = bearer_token(headers) else {
        tracing::debug!("Request has no usable bearer token");
        return None;
    };
    state.validator.validate(token).await
}

/// Extractor for handlers that require a valid bearer token.
///
/// Rejects with 401 when the header is missing or malformed or the token
/// fails validation; the cause is only logged.
#[derive(Debug, Clone)]
pub struct Authenticated(pub ValidatedToken);

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state)
            .await
            .map(Authenticated)
            .ok_or(ApiError::Unauthorized)
    }
}
