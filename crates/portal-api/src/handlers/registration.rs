//! Registration flow handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::dto::{validated, CompleteRegistrationRequest, VerifyOtpRequest, VerifyUserRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /verify-user
pub async fn verify_user(
    State(state): State<AppState>,
    Json(payload): Json<VerifyUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .registration
        .verify_user(&payload.customer_number, &payload.email)
        .await?;
    Ok(Json(json!({
        "message": "OTP sent successfully to your email."
    })))
}

/// POST /verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .registration
        .verify_otp(&payload.customer_number, &payload.email, &payload.otp)
        .await?;
    Ok(Json(json!({ "message": "OTP verified successfully." })))
}

/// POST /complete-registration
pub async fn complete_registration(
    State(state): State<AppState>,
    Json(payload): Json<CompleteRegistrationRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .registration
        .complete_registration(
            &payload.customer_number,
            &payload.email,
            &payload.otp,
            &payload.new_password,
        )
        .await?;
    Ok(Json(json!({
        "message": "Registration completed successfully. You can now log in."
    })))
}
