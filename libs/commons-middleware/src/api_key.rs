//! API key gate middleware
//!
//! Validates a caller-supplied key from a header or query parameter
//! against a static allow-list, with path-based opt-in/opt-out.
//!
//! ## Design
//! - Configuration is validated once at construction; an unusable policy
//!   aborts startup, never a request
//! - Path rules decide whether a request is gated at all: a non-empty
//!   include list gates only matching paths, the exclude list exempts
//!   matching paths otherwise
//! - Header lookup wins over query lookup; the first value wins within each
//! - Rejection short-circuits with 401 and an `application/problem+json`
//!   body, and logs exactly one authentication event
//!
//! ## Example
//! ```rust
//! use actix_web::App;
//! use commons_middleware::api_key::{ApiKeyConfig, ApiKeyMiddleware};
//!
//! let gate = ApiKeyMiddleware::new(ApiKeyConfig {
//!     valid_keys: ["secret".to_string()].into_iter().collect(),
//!     header_name: Some("X-API-KEY".to_string()),
//!     query_name: Some("apikey".to_string()),
//!     ..ApiKeyConfig::default()
//! })
//! .unwrap();
//! let app = App::new().wrap(gate);
//! ```

use std::collections::HashSet;
use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderName,
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use commons_core::{events, ConfigError};

use crate::correlation_id::parse_header_name;

/// API key gate options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeyConfig {
    /// Accepted key values; membership is exact and case-sensitive
    pub valid_keys: HashSet<String>,
    /// Header to read the key from
    #[serde(default)]
    pub header_name: Option<String>,
    /// Query parameter to read the key from when the header is absent
    #[serde(default)]
    pub query_name: Option<String>,
    /// When non-empty, only paths under one of these segments are gated
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Paths under one of these segments bypass the gate
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

/// Body returned on rejection, RFC 7807 shape
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    pub title: &'static str,
    pub status: u16,
    pub detail: &'static str,
    #[serde(rename = "traceId")]
    pub trace_id: String,
}

impl ProblemDetails {
    fn unauthorized() -> Self {
        Self {
            title: "Unauthorized",
            status: 401,
            detail: "Api key is not valid",
            trace_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug)]
struct Policy {
    valid_keys: HashSet<String>,
    header_name: Option<HeaderName>,
    query_name: Option<String>,
    include_paths: Vec<String>,
    exclude_paths: Vec<String>,
}

impl Policy {
    /// Path rules exempting a request from validation. A non-empty
    /// include list is checked first and wins over the exclude list.
    fn should_skip(&self, path: &str) -> bool {
        if !self.include_paths.is_empty()
            && !self
                .include_paths
                .iter()
                .any(|prefix| starts_with_segments(path, prefix))
        {
            return true;
        }
        self.exclude_paths
            .iter()
            .any(|prefix| starts_with_segments(path, prefix))
    }

    fn extract_key(&self, req: &ServiceRequest) -> String {
        if let Some(name) = &self.header_name {
            if let Some(value) = req.headers().get(name) {
                return value.to_str().unwrap_or_default().to_string();
            }
        }
        if let Some(name) = &self.query_name {
            if let Some(value) = first_query_value(req.query_string(), name) {
                return value;
            }
        }
        String::new()
    }

    fn is_valid(&self, key: &str) -> bool {
        !key.trim().is_empty() && self.valid_keys.contains(key)
    }
}

/// Segment-aware prefix match: `/api` covers `/api` and `/api/v1` but
/// not `/apix`.
fn starts_with_segments(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// First occurrence of `name` in the raw query string, percent-decoded.
fn first_query_value(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = urlencoding::decode(parts.next()?).ok()?;
        if key != name {
            return None;
        }
        let value = urlencoding::decode(parts.next().unwrap_or_default()).ok()?;
        Some(value.into_owned())
    })
}

/// Middleware validating an API key before the request reaches handlers
#[derive(Debug)]
pub struct ApiKeyMiddleware {
    policy: Rc<Policy>,
}

impl ApiKeyMiddleware {
    /// Validates the policy up front: at least one accepted key and at
    /// least one lookup location are required.
    pub fn new(config: ApiKeyConfig) -> Result<Self, ConfigError> {
        if config.valid_keys.is_empty() {
            return Err(ConfigError::EmptyApiKeys);
        }

        let header_name = match config.header_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(parse_header_name(name)?),
            _ => None,
        };
        let query_name = config.query_name.filter(|name| !name.trim().is_empty());

        if header_name.is_none() && query_name.is_none() {
            return Err(ConfigError::MissingLookupName);
        }

        Ok(Self {
            policy: Rc::new(Policy {
                valid_keys: config.valid_keys,
                header_name,
                query_name,
                include_paths: config.include_paths,
                exclude_paths: config.exclude_paths,
            }),
        })
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyService {
            service: Rc::new(service),
            policy: self.policy.clone(),
        }))
    }
}

pub struct ApiKeyService<S> {
    service: Rc<S>,
    policy: Rc<Policy>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            if policy.should_skip(req.path()) {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            }

            let key = policy.extract_key(&req);
            if policy.is_valid(&key) {
                let res = service.call(req).await?;
                return Ok(res.map_into_boxed_body());
            }

            let problem = ProblemDetails::unauthorized();

            tracing::error!(
                category = events::AUTHENTICATION,
                trace_id = %problem.trace_id,
                path = req.path(),
                "{}",
                problem.detail,
            );

            let body = serde_json::to_string(&problem).unwrap_or_default();
            let response = HttpResponse::Unauthorized()
                .content_type("application/problem+json")
                .body(body);

            Ok(req.into_response(response))
        })
    }
}
