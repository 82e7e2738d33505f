//! Referral handlers

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use portal_core::services::referrals::SubmitReferralCommand;

use crate::dto::{validated, SubmitReferralRequest};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /referrals
pub async fn submit_referral(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SubmitReferralRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    let cmd = SubmitReferralCommand {
        referred_name: payload.referred_name,
        referred_email: payload.referred_email,
        property_id: payload.property_id,
    };
    state.referrals.submit(&user, &cmd).await?;
    Ok(Json(json!({ "message": "Referral submitted successfully" })))
}

/// GET /referrals
pub async fn list_referrals(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let referrals = state.referrals.list(&user).await?;
    Ok(Json(json!({ "referrals": referrals })))
}
