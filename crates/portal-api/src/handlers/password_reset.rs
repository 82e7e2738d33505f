//! Password reset flow handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::dto::{validated, RequestOtpRequest, ResetPasswordRequest, VerifyOtpResetRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /request-otp
pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<RequestOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state.password_reset.request_otp(&payload.email).await?;
    Ok(Json(json!({
        "message": "OTP sent successfully to your email."
    })))
}

/// POST /verify-otp-reset
pub async fn verify_otp_reset(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .password_reset
        .verify_otp(&payload.email, &payload.otp)
        .await?;
    Ok(Json(json!({ "message": "OTP verified successfully." })))
}

/// POST /reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .password_reset
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(Json(json!({
        "message": "Password reset successfully. You can now log in."
    })))
}
