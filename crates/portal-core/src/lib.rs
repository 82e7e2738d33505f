//! # Portal Core
//!
//! Domain types, store traits, outbound gateway traits, and the services
//! that implement the portal's business rules. Everything here is
//! persistence- and transport-agnostic; `portal-infrastructure` supplies the
//! store and gateway implementations and `portal-api` the HTTP surface.

pub mod domain;
pub mod error;
pub mod gateways;
pub mod repositories;
pub mod services;
