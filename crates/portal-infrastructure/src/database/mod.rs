//! Database module (MySQL adapters)

pub mod connection;
pub mod mysql;

pub use connection::create_pool;
pub use mysql::{MySqlCrmStore, MySqlLedgerStore, MySqlPortalStore};
