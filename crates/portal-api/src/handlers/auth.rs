//! Login and logout handlers

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use portal_core::services::LoginResult;

use crate::dto::{validated, LoginRequest};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResult>, ApiError> {
    let payload = validated(payload)?;
    let result = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(result))
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    state.auth.logout(user.id).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}
