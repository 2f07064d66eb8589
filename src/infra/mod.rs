//! Infrastructure adapters and runtime bootstrap.

pub mod auth;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod uploads;
