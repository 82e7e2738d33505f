//! # Portal Shared
//!
//! Configuration, telemetry, and helpers shared by every portal crate.

pub mod config;
pub mod decimal;
pub mod telemetry;
