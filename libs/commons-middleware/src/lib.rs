//! # Commons Middleware
//!
//! Request-boundary middleware for actix-web services
//!
//! ## Modules
//! - `correlation_id`: correlation token extraction/generation and response reflection
//! - `api_key`: static API key gate with path include/exclude rules
//! - `log_context`: per-request span enrichment for log events
//! - `health`: liveness handler
//! - `telemetry`: tracing bootstrap
//!
//! Middleware execute in reverse registration order; register the gate
//! first and the correlation middleware last so a request flows
//! correlation -> log context -> gate -> handler:
//!
//! ```rust
//! use actix_web::App;
//! use commons_middleware::api_key::{ApiKeyConfig, ApiKeyMiddleware};
//! use commons_middleware::correlation_id::{CorrelationConfig, CorrelationIdMiddleware};
//! use commons_middleware::log_context::LogContextMiddleware;
//!
//! let gate = ApiKeyMiddleware::new(ApiKeyConfig {
//!     valid_keys: ["secret".to_string()].into_iter().collect(),
//!     header_name: Some("X-API-KEY".to_string()),
//!     ..ApiKeyConfig::default()
//! })
//! .unwrap();
//! let correlation = CorrelationIdMiddleware::new(CorrelationConfig::default()).unwrap();
//!
//! let app = App::new()
//!     .wrap(gate)
//!     .wrap(LogContextMiddleware)
//!     .wrap(correlation);
//! ```

pub mod api_key;
pub mod correlation_id;
pub mod health;
pub mod log_context;
pub mod telemetry;

pub use api_key::{ApiKeyConfig, ApiKeyMiddleware};
pub use correlation_id::{correlation_id, CorrelationConfig, CorrelationIdMiddleware};
pub use log_context::LogContextMiddleware;
