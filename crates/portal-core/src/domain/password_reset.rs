//! Password reset OTP record
//!
//! Several rows may exist per user; the newest one by creation time is the
//! authoritative code.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: u64,
    pub user_id: u64,
    pub otp: String,
    pub otp_generated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
