//! Notification and push-token handlers

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::dto::{validated, SavePushTokenRequest, SendNotificationRequest};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let notifications = state.notifications.list(user.id).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

/// POST /save-push-token
pub async fn save_push_token(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SavePushTokenRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .notifications
        .save_push_token(user.id, &payload.push_token)
        .await?;
    Ok(Json(json!({ "message": "Push token saved successfully" })))
}

/// POST /send-notification
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;
    state
        .notifications
        .send_to_user(
            payload.user_id,
            &payload.title,
            &payload.body,
            payload.data.as_deref().unwrap_or("{}"),
        )
        .await?;
    Ok(Json(json!({ "message": "Notification sent successfully" })))
}
