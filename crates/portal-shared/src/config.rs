//! Configuration management
//!
//! Everything is environment-driven: variable names match what operations
//! already exports for the Go deployment, so the same `.env` keeps working.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    // Database DSNs (MySQL) for the three logical stores
    pub portal_database_url: String,
    pub crm_database_url: String,
    pub ledger_database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    // Bearer tokens
    pub jwt_secret: String,
    #[serde(default = "default_token_validity_hours")]
    pub jwt_validity_hours: i64,

    // SMTP (OTP delivery)
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_sender: String,
    pub smtp_user: String,
    pub smtp_pass: String,

    // Push service (Expo)
    pub push_base_url: String,

    // Daraja (M-PESA) gateway
    pub daraja_consumer_key: String,
    pub daraja_consumer_secret: String,
    pub daraja_passkey: String,
    pub daraja_business_short_code: String,
    pub daraja_callback_url: String,
    #[serde(default)]
    pub daraja_environment: DarajaEnvironment,

    pub cors_origin: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DarajaEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl DarajaEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            DarajaEnvironment::Sandbox => "https://sandbox.safaricom.co.ke",
            DarajaEnvironment::Production => "https://api.safaricom.co.ke",
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_smtp_port() -> u16 {
    465
}

fn default_token_validity_hours() -> i64 {
    24
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
