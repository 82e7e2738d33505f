//! Portal M-PESA payment record
//!
//! One row per STK push initiation; the checkout request id issued by the
//! gateway is the unique key the asynchronous callback correlates on.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Success => "Success",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(PaymentStatus::Pending),
            "Success" => Some(PaymentStatus::Success),
            "Failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MpesaPayment {
    pub id: u64,
    pub checkout_request_id: String,
    pub installment_schedule_id: i32,
    pub customer_number: String,
    pub phone_number: String,
    pub amount: String,
    pub plot_number: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl MpesaPayment {
    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct NewMpesaPayment {
    pub checkout_request_id: String,
    pub installment_schedule_id: i32,
    pub customer_number: String,
    pub phone_number: String,
    pub amount: String,
    pub plot_number: String,
}
