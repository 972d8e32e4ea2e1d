//! Log event categories
//!
//! Attached as the `category` field on structured log events so sinks
//! can route web-layer and infrastructure-layer failures separately.

/// Credential validation failures at the request boundary
pub const AUTHENTICATION: &str = "authentication";

/// Non-success responses from downstream service calls
pub const API_CLIENT: &str = "api_client";
