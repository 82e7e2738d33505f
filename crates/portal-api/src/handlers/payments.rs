//! M-PESA payment handlers

use axum::{body::Bytes, extract::State, http::StatusCode, Extension, Json};
use serde_json::{json, Value};
use tracing::{error, warn};

use portal_core::services::payments::{InitiatePaymentCommand, StkCallbackEnvelope};

use crate::dto::{validated, InitiateMpesaPaymentRequest};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// POST /initiate-mpesa-payment
pub async fn initiate_mpesa_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<InitiateMpesaPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = validated(payload)?;

    let cmd = InitiatePaymentCommand {
        amount: payload.amount,
        phone_number: payload.phone_number,
        installment_schedule_id: payload.installment_schedule_id,
        customer_number: payload.customer_number,
        plot_number: payload.plot_number,
    };

    // Runs detached: once the gateway accepts the push the correlation row
    // must land even if this client disconnects before we answer.
    let payments = state.payments.clone();
    let ack = tokio::spawn(async move { payments.initiate(&user, &cmd).await })
        .await
        .map_err(|e| ApiError::Internal(format!("payment initiation task failed: {}", e)))??;

    Ok(Json(json!({
        "message": "M-PESA payment initiated",
        "MerchantRequestID": ack.merchant_request_id,
        "CheckoutRequestID": ack.checkout_request_id,
        "ResponseCode": ack.response_code,
        "ResponseDescription": ack.response_description,
        "CustomerMessage": ack.customer_message,
    })))
}

/// POST /mpesa/callback, the unauthenticated gateway ingress.
///
/// Processing failures are logged and still acknowledged with 200: the
/// gateway retries on anything else, and the conditional status transition
/// already makes redelivery safe. Only an unparseable body earns a 400.
pub async fn mpesa_callback(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let envelope: StkCallbackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("unparseable M-PESA callback: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid callback data" })),
            );
        }
    };

    if let Err(e) = state
        .payments
        .handle_callback(&envelope.body.stk_callback)
        .await
    {
        error!("M-PESA callback processing failed: {}", e);
    }

    (
        StatusCode::OK,
        Json(json!({ "message": "Callback received" })),
    )
}
