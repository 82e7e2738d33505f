//! # Portal Infrastructure
//!
//! Database and outbound-gateway implementations (adapters).

pub mod database;
pub mod gateways;

pub use database::{create_pool, MySqlCrmStore, MySqlLedgerStore, MySqlPortalStore};
pub use gateways::{DarajaClient, ExpoPushClient, SmtpOtpMailer};
