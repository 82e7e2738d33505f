//! Login and logout

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use portal_security::jwt::JwtService;
use portal_security::password::PasswordService;

use crate::domain::LeadFile;
use crate::error::DomainError;
use crate::repositories::{CrmStore, PortalStore};

pub struct AuthService {
    portal: Arc<dyn PortalStore>,
    crm: Arc<dyn CrmStore>,
    jwt: Arc<JwtService>,
}

/// What a successful login returns to the client.
#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: u64,
    pub email: String,
    pub name: String,
    #[serde(rename = "customerNumber")]
    pub customer_number: String,
    #[serde(rename = "leadFiles")]
    pub lead_files: Vec<LeadFile>,
}

impl AuthService {
    pub fn new(portal: Arc<dyn PortalStore>, crm: Arc<dyn CrmStore>, jwt: Arc<JwtService>) -> Self {
        Self { portal, crm, jwt }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, DomainError> {
        let email = email.trim();
        let password = password.trim();

        let user = self
            .portal
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| {
                warn!("login failed: unknown email: {}", email);
                DomainError::Unauthenticated("Invalid email or password.".to_string())
            })?;

        let password_valid = PasswordService::verify(password, &user.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !password_valid {
            warn!("login failed: bad password for: {}", email);
            return Err(DomainError::Unauthenticated(
                "Invalid email or password.".to_string(),
            ));
        }

        let customer = self
            .crm
            .find_customer_by_number(&user.customer_number)
            .await?
            .ok_or_else(|| {
                DomainError::Internal("customer record missing for portal user".to_string())
            })?;

        let lead_files = self.crm.active_lead_files(&user.customer_number).await?;

        let access_token = self
            .jwt
            .generate_access_token(user.id)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        info!("login successful for: {}", email);

        Ok(LoginResult {
            access_token,
            user: LoginUser {
                id: user.id,
                email: user.email,
                name: customer.customer_name,
                customer_number: user.customer_number,
                lead_files,
            },
        })
    }

    /// Stamps the logout time; the auth middleware rejects any token issued
    /// before it.
    pub async fn logout(&self, user_id: u64) -> Result<(), DomainError> {
        self.portal.update_last_logout(user_id, Utc::now()).await?;
        info!("user {} logged out", user_id);
        Ok(())
    }
}
