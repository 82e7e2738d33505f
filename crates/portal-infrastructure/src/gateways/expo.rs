//! Expo push service client
//!
//! One JSON POST per notification. Callers treat failures as
//! fire-and-forget; this client only reports them.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use portal_core::error::DomainError;
use portal_core::gateways::PushSender;

const PUSH_SEND_PATH: &str = "/--/api/v2/push/send";

#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    sound: &'static str,
    title: &'a str,
    body: &'a str,
}

pub struct ExpoPushClient {
    http: Client,
    base_url: String,
}

impl ExpoPushClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
        }
    }
}

#[async_trait]
impl PushSender for ExpoPushClient {
    async fn send(&self, push_token: &str, title: &str, body: &str) -> Result<(), DomainError> {
        let message = PushMessage {
            to: push_token,
            sound: "default",
            title,
            body,
        };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, PUSH_SEND_PATH))
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                error!("Push dispatch failed: {}", e);
                DomainError::Upstream("Failed to reach the push service".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Push service rejected dispatch ({}): {}", status, body);
            return Err(DomainError::Upstream(format!(
                "Push service rejected dispatch: {}",
                status
            )));
        }

        info!("push notification dispatched");
        Ok(())
    }
}
