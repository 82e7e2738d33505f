//! Outbound gateway traits
//!
//! The payment gateway, push service, and OTP mailer are external
//! collaborators; `portal-infrastructure` carries the HTTP/SMTP
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// An STK push to be placed against the subscriber's phone.
#[derive(Debug, Clone)]
pub struct StkPushOrder {
    /// Whole shillings.
    pub amount: u64,
    /// 2547XXXXXXXX
    pub phone_number: String,
    /// Shown on the subscriber's statement; the plot number being paid for.
    pub account_reference: String,
    pub description: String,
}

/// The gateway's synchronous acknowledgement of an STK push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkPushAck {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    #[serde(rename = "CustomerMessage")]
    pub customer_message: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn stk_push(&self, order: &StkPushOrder) -> Result<StkPushAck, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, push_token: &str, title: &str, body: &str) -> Result<(), DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), DomainError>;
}
