//! # Portal API
//!
//! HTTP surface of the customer portal: route table, DTO validation, auth
//! middleware, error mapping, and PDF statement rendering. Business rules
//! live in `portal-core`; this crate only binds them to HTTP.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pdf;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
