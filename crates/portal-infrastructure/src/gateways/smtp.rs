//! SMTP OTP mailer

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use portal_core::error::DomainError;
use portal_core::gateways::OtpMailer;
use portal_shared::config::AppConfig;

pub struct SmtpOtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpOtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        sender: &str,
        username: String,
        password: String,
    ) -> Result<Self, DomainError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| DomainError::Internal(format!("invalid SMTP relay: {}", e)))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();
        let sender = sender
            .parse()
            .map_err(|e| DomainError::Internal(format!("invalid SMTP sender address: {}", e)))?;
        Ok(Self { transport, sender })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DomainError> {
        Self::new(
            &config.smtp_host,
            config.smtp_port,
            &config.smtp_sender,
            config.smtp_user.clone(),
            config.smtp_pass.clone(),
        )
    }
}

#[async_trait]
impl OtpMailer for SmtpOtpMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), DomainError> {
        let recipient = email
            .parse()
            .map_err(|_| DomainError::Validation("Invalid email address".to_string()))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject("Your OTP Code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your OTP code is: {}", otp))
            .map_err(|e| DomainError::Internal(format!("failed to build OTP email: {}", e)))?;

        self.transport.send(message).await.map_err(|e| {
            error!("Failed to send OTP email to {}: {}", email, e);
            DomainError::Upstream("Failed to send the OTP email".to_string())
        })?;

        info!("OTP email sent to {}", email);
        Ok(())
    }
}
