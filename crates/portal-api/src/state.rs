//! Shared application state

use std::sync::Arc;

use portal_core::repositories::PortalStore;
use portal_core::services::{
    AuthService, CampaignService, NotificationService, PasswordResetService, PaymentService,
    PropertyService, ReferralService, RegistrationService,
};
use portal_security::jwt::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub registration: Arc<RegistrationService>,
    pub password_reset: Arc<PasswordResetService>,
    pub payments: Arc<PaymentService>,
    pub properties: Arc<PropertyService>,
    pub notifications: Arc<NotificationService>,
    pub referrals: Arc<ReferralService>,
    pub campaigns: Arc<CampaignService>,
    // The middleware resolves bearer tokens to users directly.
    pub portal: Arc<dyn PortalStore>,
    pub jwt: Arc<JwtService>,
}
