//! Campaign handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /campaigns/monthly
pub async fn monthly_campaign(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let campaign = state.campaigns.monthly().await?;
    Ok(Json(json!({ "campaign": campaign })))
}
