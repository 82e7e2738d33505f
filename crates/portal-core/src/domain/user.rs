//! Portal user account

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: u64,
    pub customer_number: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub verified: bool,
    pub user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(skip_serializing)]
    pub last_logout_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user after OTP verification.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub customer_number: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub user_type: String,
}
