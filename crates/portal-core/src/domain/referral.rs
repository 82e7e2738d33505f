//! Customer referral

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Referral {
    pub id: u64,
    pub referrer_id: String,
    pub referred_name: String,
    pub referred_email: String,
    pub property_id: String,
    pub status: String,
    pub amount_paid: f64,
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub referrer_id: String,
    pub referred_name: String,
    pub referred_email: String,
    pub property_id: String,
}
