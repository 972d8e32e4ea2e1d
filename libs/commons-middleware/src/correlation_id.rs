//! Request correlation middleware
//!
//! Extracts or generates a correlation token for every inbound request
//! and reflects it in the response header.
//!
//! ## Design
//! - If the request carries the configured header: use its first value verbatim
//! - Otherwise: generate a UUID v4
//! - Store the token in request extensions for handlers, the log context
//!   middleware and outbound clients
//! - Add the response header once, on the way out, only if nothing
//!   downstream set it already; this also covers responses produced from
//!   handler errors
//!
//! ## Example
//! ```rust
//! use actix_web::App;
//! use commons_middleware::correlation_id::{CorrelationConfig, CorrelationIdMiddleware};
//!
//! let correlation = CorrelationIdMiddleware::new(CorrelationConfig::default()).unwrap();
//! let app = App::new().wrap(correlation);
//! ```

use std::future::{ready, Ready};

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;
use serde::Deserialize;

use commons_core::{ConfigError, CorrelationId, DEFAULT_CORRELATION_HEADER};

/// Correlation middleware options
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Lookup name in the request header, also used for the response header
    pub header: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_CORRELATION_HEADER.to_string(),
        }
    }
}

/// Middleware that manages request correlation tokens
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware {
    header: HeaderName,
}

impl CorrelationIdMiddleware {
    /// Validates the configured header name up front; an empty or
    /// malformed name aborts startup instead of surfacing per request.
    pub fn new(config: CorrelationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            header: parse_header_name(&config.header)?,
        })
    }
}

impl Default for CorrelationIdMiddleware {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static("x-correlation-id"),
        }
    }
}

pub(crate) fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyHeaderName);
    }
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

impl<S, B> Transform<S, ServiceRequest> for CorrelationIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationIdService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationIdService {
            service,
            header: self.header.clone(),
        }))
    }
}

pub struct CorrelationIdService<S> {
    service: S,
    header: HeaderName,
}

impl<S, B> Service<ServiceRequest> for CorrelationIdService<S>
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
        let header = self.header.clone();

        // First value wins when the caller sent the header more than once.
        let correlation_id = req
            .headers()
            .get(&header)
            .and_then(|value| value.to_str().ok())
            .map(CorrelationId::new)
            .unwrap_or_else(CorrelationId::generate);

        req.extensions_mut().insert(correlation_id.clone());

        let request = req.request().clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            // A failed handler still produces a response; the header
            // commitment below must cover that response as well.
            let mut res = match fut.await {
                Ok(res) => res.map_into_boxed_body(),
                Err(err) => ServiceResponse::new(request, err.error_response()),
            };

            if !res.headers().contains_key(&header) {
                if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
                    res.headers_mut().insert(header, value);
                }
            }

            Ok(res)
        })
    }
}

/// Read the correlation token stored by [`CorrelationIdMiddleware`].
///
/// Returns `None` when the middleware is not installed.
pub fn correlation_id(req: &HttpRequest) -> Option<CorrelationId> {
    req.extensions().get::<CorrelationId>().cloned()
}
