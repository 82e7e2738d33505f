//! Business services

pub mod auth;
pub mod campaigns;
pub mod notifications;
pub mod password_reset;
pub mod payments;
pub mod properties;
pub mod referrals;
pub mod registration;

/// OTPs are accepted for ten minutes from generation.
pub(crate) const OTP_VALIDITY_MINUTES: i64 = 10;

pub use auth::{AuthService, LoginResult};
pub use campaigns::CampaignService;
pub use notifications::NotificationService;
pub use password_reset::PasswordResetService;
pub use payments::PaymentService;
pub use properties::PropertyService;
pub use referrals::ReferralService;
pub use registration::RegistrationService;
