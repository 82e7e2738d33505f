//! Route table and cross-cutting layers

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    auth, campaigns, notifications, password_reset, payments, properties, referrals, registration,
};
use crate::middleware::require_auth;
use crate::state::AppState;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

pub fn build_router(state: AppState, cors_origin: HeaderValue) -> Router {
    // Login, the registration/reset OTP flows, the gateway callback, and the
    // public campaign endpoint never carry a bearer token.
    let public_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/verify-user", post(registration::verify_user))
        .route("/verify-otp", post(registration::verify_otp))
        .route(
            "/complete-registration",
            post(registration::complete_registration),
        )
        .route("/request-otp", post(password_reset::request_otp))
        .route("/verify-otp-reset", post(password_reset::verify_otp_reset))
        .route("/reset-password", post(password_reset::reset_password))
        .route("/mpesa/callback", post(payments::mpesa_callback))
        .route("/campaigns/monthly", get(campaigns::monthly_campaign));

    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/properties", get(properties::list_properties))
        .route(
            "/properties/{lead_file_no}/installment-schedule",
            get(properties::installment_schedule),
        )
        .route(
            "/properties/{lead_file_no}/installment-schedule/pdf",
            get(properties::installment_schedule_pdf),
        )
        .route(
            "/properties/{lead_file_no}/transactions",
            get(properties::transactions),
        )
        .route(
            "/properties/{lead_file_no}/receipts",
            get(properties::receipts),
        )
        .route(
            "/properties/{lead_file_no}/receipts/{receipt_id}/pdf",
            get(properties::receipt_pdf),
        )
        .route(
            "/properties/{lead_file_no}/title-status",
            get(properties::title_status),
        )
        .route("/projects", get(properties::projects))
        .route("/total-spent", get(properties::total_spent))
        .route(
            "/initiate-mpesa-payment",
            post(payments::initiate_mpesa_payment),
        )
        .route("/save-push-token", post(notifications::save_push_token))
        .route("/notifications", get(notifications::list_notifications))
        .route("/send-notification", post(notifications::send_notification))
        .route(
            "/referrals",
            post(referrals::submit_referral).get(referrals::list_referrals),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(PREFLIGHT_MAX_AGE)
}
