//! # unifi-core
//!
//! Core plumbing for talking to the UniFi Site Manager API.
//!
//! This crate owns the pieces every endpoint call goes through: the immutable
//! client configuration, a session manager that hands out a pooled HTTP
//! transport and rotates it on expiry, and a request executor that applies the
//! timeout, retries once on authentication failure and normalizes errors.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy shared by all crates
//! - [`config`] - Client configuration and validation
//! - [`client`] - Transport tuning constants and retry policy
//! - [`session`] - Session lifecycle (creation, expiry, rotation, close)
//! - [`executor`] - Single request path with authentication retry
//! - [`query`] - Query parameter builder
//! - [`timestamp`] - RFC3339 timestamp validation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod session;
pub mod timestamp;

// Re-export commonly used types
pub use config::SiteManagerConfig;
pub use error::{ApiError, Error, Result};
pub use executor::RequestExecutor;
pub use session::{Session, SessionManager};
