//! Customer referrals

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::domain::{NewReferral, Referral, User};
use crate::error::DomainError;
use crate::repositories::PortalStore;

/// A referral as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReferralCommand {
    pub referred_name: String,
    pub referred_email: String,
    pub property_id: String,
}

pub struct ReferralService {
    portal: Arc<dyn PortalStore>,
}

impl ReferralService {
    pub fn new(portal: Arc<dyn PortalStore>) -> Self {
        Self { portal }
    }

    /// New referrals start Pending with nothing earned; the referrer is
    /// always the authenticated caller, never client-supplied.
    pub async fn submit(
        &self,
        user: &User,
        cmd: &SubmitReferralCommand,
    ) -> Result<Referral, DomainError> {
        if cmd.referred_name.trim().is_empty() || cmd.referred_email.trim().is_empty() {
            return Err(DomainError::Validation(
                "Referred name and email are required".to_string(),
            ));
        }

        let referral = NewReferral {
            referrer_id: user.customer_number.clone(),
            referred_name: cmd.referred_name.trim().to_string(),
            referred_email: cmd.referred_email.trim().to_string(),
            property_id: cmd.property_id.clone(),
        };
        let created = self.portal.create_referral(&referral).await?;

        info!("referral submitted by customer {}", user.customer_number);
        Ok(created)
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Referral>, DomainError> {
        self.portal
            .referrals_for_customer(&user.customer_number)
            .await
    }
}
