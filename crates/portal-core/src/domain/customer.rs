//! CRM customer record (read-mostly; only the OTP fields are ever written)

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub customer_no: String,
    pub customer_name: String,
    pub phone: String,
    pub primary_email: String,
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_generated_at: Option<NaiveDateTime>,
}
