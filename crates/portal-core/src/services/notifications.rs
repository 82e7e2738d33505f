//! Notification dispatch and history
//!
//! Push delivery is fire-and-forget: a failed push never changes the
//! business outcome of the caller. The persisted notification row is written
//! regardless.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Notification, User};
use crate::error::DomainError;
use crate::gateways::PushSender;
use crate::repositories::PortalStore;

pub struct NotificationService {
    portal: Arc<dyn PortalStore>,
    push: Arc<dyn PushSender>,
}

impl NotificationService {
    pub fn new(portal: Arc<dyn PortalStore>, push: Arc<dyn PushSender>) -> Self {
        Self { portal, push }
    }

    /// Push (when a token exists) and always record.
    pub async fn notify_user(
        &self,
        user: &User,
        title: &str,
        body: &str,
        data: &str,
    ) -> Result<(), DomainError> {
        match &user.push_token {
            Some(token) if !token.is_empty() => {
                if let Err(e) = self.push.send(token, title, body).await {
                    warn!("push dispatch failed for user {}: {}", user.id, e);
                }
            }
            _ => info!("user {} has no push token, recording only", user.id),
        }

        self.portal
            .create_notification(user.id, title, body, data)
            .await
    }

    /// Resolve the portal user behind a customer number, then notify. A
    /// missing user is logged and swallowed: payment callbacks must not fail
    /// on it.
    pub async fn notify_customer(
        &self,
        customer_number: &str,
        title: &str,
        body: &str,
        data: &str,
    ) -> Result<(), DomainError> {
        match self
            .portal
            .find_user_by_customer_number(customer_number)
            .await?
        {
            Some(user) => self.notify_user(&user, title, body, data).await,
            None => {
                warn!("no portal user for customer {}", customer_number);
                Ok(())
            }
        }
    }

    /// Explicit send endpoint: the target must exist and must have a token.
    pub async fn send_to_user(
        &self,
        user_id: u64,
        title: &str,
        body: &str,
        data: &str,
    ) -> Result<(), DomainError> {
        let user = self
            .portal
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))?;

        let token = user
            .push_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                DomainError::Validation("User does not have a push token".to_string())
            })?;

        self.push
            .send(token, title, body)
            .await
            .map_err(|e| DomainError::Upstream(e.to_string()))?;

        self.portal
            .create_notification(user.id, title, body, data)
            .await
    }

    pub async fn list(&self, user_id: u64) -> Result<Vec<Notification>, DomainError> {
        self.portal.notifications_for_user(user_id).await
    }

    /// One token per user; a new device overwrites the previous one.
    pub async fn save_push_token(
        &self,
        user_id: u64,
        push_token: &str,
    ) -> Result<(), DomainError> {
        self.portal.update_push_token(user_id, push_token).await
    }
}
