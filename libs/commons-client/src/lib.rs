//! # Commons Client
//!
//! Outbound HTTP plumbing for services: correlation propagation and
//! downstream failure logging over a shared `reqwest::Client`.

pub mod propagation;

pub use propagation::{PropagationConfig, ServiceClient};
