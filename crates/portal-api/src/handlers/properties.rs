//! Property, installment, receipt, and statement handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::pdf;
use crate::state::AppState;

/// GET /properties
pub async fn list_properties(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let properties = state.properties.properties(&user).await?;
    Ok(Json(json!({ "properties": properties })))
}

/// GET /properties/{lead_file_no}/installment-schedule
pub async fn installment_schedule(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lead_file_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let (_, schedules) = state
        .properties
        .installment_schedule(&user, &lead_file_no)
        .await?;
    Ok(Json(json!({ "installment_schedules": schedules })))
}

/// GET /properties/{lead_file_no}/installment-schedule/pdf
pub async fn installment_schedule_pdf(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lead_file_no): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (lead_file, schedules) = state
        .properties
        .installment_schedule(&user, &lead_file_no)
        .await?;
    let document = pdf::installment_schedule_statement(&user, &lead_file, &schedules)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=installment_schedule_{}.pdf",
                    lead_file_no
                ),
            ),
        ],
        document,
    ))
}

/// GET /properties/{lead_file_no}/transactions
pub async fn transactions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lead_file_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let transactions = state.properties.transactions(&user, &lead_file_no).await?;
    Ok(Json(json!({ "transactions": transactions })))
}

/// GET /properties/{lead_file_no}/receipts
pub async fn receipts(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lead_file_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let receipts = state.properties.receipts(&user, &lead_file_no).await?;
    Ok(Json(json!({ "receipts": receipts })))
}

/// GET /properties/{lead_file_no}/receipts/{receipt_id}/pdf
pub async fn receipt_pdf(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((lead_file_no, receipt_id)): Path<(String, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let (lead_file, receipt) = state
        .properties
        .receipt(&user, &lead_file_no, receipt_id)
        .await?;
    let document = pdf::receipt_statement(&lead_file, &receipt)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=receipt_{}.pdf", receipt_id),
            ),
        ],
        document,
    ))
}

/// GET /properties/{lead_file_no}/title-status
pub async fn title_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(lead_file_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let title_status = state.properties.title_status(&user, &lead_file_no).await?;
    Ok(Json(json!({ "title_status": title_status })))
}

/// GET /projects
pub async fn projects(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let projects = state.properties.projects(&user).await?;
    Ok(Json(json!({ "projects": projects })))
}

/// GET /total-spent
pub async fn total_spent(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let total_spent = state.properties.total_spent(&user).await?;
    Ok(Json(json!({ "total_spent": total_spent })))
}
