//! # Commons Core
//!
//! Framework-free types shared across the commons workspace
//!
//! ## Modules
//! - `correlation`: request correlation token
//! - `events`: log event categories
//! - `error`: configuration errors

pub mod correlation;
pub mod error;
pub mod events;

pub use correlation::{CorrelationId, DEFAULT_CORRELATION_HEADER};
pub use error::ConfigError;
