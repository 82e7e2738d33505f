//! Bearer-token auth middleware
//!
//! Verifies the signature, then compares the token's issue time against the
//! user's last logout: logging out revokes every earlier token without any
//! stored blacklist.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use portal_core::domain::User;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated portal user, inserted into request extensions for
/// protected handlers.
#[derive(Clone)]
pub struct CurrentUser(pub User);

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    let user = state
        .portal
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    if let Some(logout_at) = user.last_logout_at {
        if claims.issued_before(logout_at) {
            return Err(ApiError::Unauthorized(
                "Token has been revoked. Please log in again.".to_string(),
            ));
        }
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header must be a bearer token".to_string())
        })
}
