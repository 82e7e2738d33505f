//! Password reset flow
//!
//! Reset OTPs live in their own table; the user row is untouched until the
//! password is actually rewritten. The newest row per user wins.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use portal_security::otp::generate_otp;
use portal_security::password::PasswordService;

use crate::domain::{PasswordReset, User};
use crate::error::DomainError;
use crate::gateways::OtpMailer;
use crate::repositories::PortalStore;
use crate::services::OTP_VALIDITY_MINUTES;

pub struct PasswordResetService {
    portal: Arc<dyn PortalStore>,
    mailer: Arc<dyn OtpMailer>,
}

impl PasswordResetService {
    pub fn new(portal: Arc<dyn PortalStore>, mailer: Arc<dyn OtpMailer>) -> Self {
        Self { portal, mailer }
    }

    pub async fn request_otp(&self, email: &str) -> Result<(), DomainError> {
        let user = self.lookup_user(email).await?;

        let otp = generate_otp();
        self.portal
            .create_password_reset(user.id, &otp, Utc::now())
            .await?;
        self.mailer.send_otp(&user.email, &otp).await?;

        info!("password reset OTP issued for user {}", user.id);
        Ok(())
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), DomainError> {
        let user = self.lookup_user(email).await?;
        self.validate_latest(&user, otp).await.map(|_| ())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let user = self.lookup_user(email).await?;
        let reset = self.validate_latest(&user, otp).await?;

        let password_hash = PasswordService::hash(new_password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        self.portal
            .update_user_password(user.id, &password_hash)
            .await?;

        // Not critical if this fails; the next request would mint a fresh row.
        if let Err(e) = self.portal.delete_password_reset(reset.id).await {
            warn!("failed to delete used password reset row: {}", e);
        }

        info!("password reset completed for user {}", user.id);
        Ok(())
    }

    async fn lookup_user(&self, email: &str) -> Result<User, DomainError> {
        self.portal
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!("password reset for unknown email: {}", email);
                DomainError::Unauthenticated(
                    "User not found. Please check your email address.".to_string(),
                )
            })
    }

    async fn validate_latest(
        &self,
        user: &User,
        otp: &str,
    ) -> Result<PasswordReset, DomainError> {
        let reset = self
            .portal
            .latest_password_reset(user.id)
            .await?
            .ok_or_else(|| {
                DomainError::Unauthenticated(
                    "OTP not found or expired. Please request a new OTP.".to_string(),
                )
            })?;

        if otp != reset.otp {
            warn!("password reset OTP mismatch for user {}", user.id);
            return Err(DomainError::Unauthenticated(
                "The OTP is incorrect. Please try again or request a new one.".to_string(),
            ));
        }

        if Utc::now() > reset.otp_generated_at + Duration::minutes(OTP_VALIDITY_MINUTES) {
            return Err(DomainError::Unauthenticated(
                "The OTP has expired. Please request a new OTP.".to_string(),
            ));
        }

        Ok(reset)
    }
}
