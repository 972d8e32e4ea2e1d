//! Request log context middleware
//!
//! Wraps the whole downstream future in a `tracing` span so every log
//! event emitted while the request is in flight carries the correlation
//! token, host, query string and method. The span closes with the
//! future, so the context never leaks into unrelated work; tasks
//! spawned inside a handler inherit it by instrumenting the spawned
//! future with `tracing::Span::current()`.

use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use tracing::Instrument;

use commons_core::CorrelationId;

/// Middleware attaching request metadata to all log events of a request
#[derive(Clone, Default)]
pub struct LogContextMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LogContextMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LogContextService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LogContextService { service }))
    }
}

pub struct LogContextService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LogContextService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let correlation_id = req
            .extensions()
            .get::<CorrelationId>()
            .map(|id| id.as_str().to_owned())
            .unwrap_or_default();
        // connection_info() caches into request extensions; keep it out
        // of the extensions() borrow above.
        let host = req.connection_info().host().to_string();
        let method = req.method().to_string();
        let query_string = req.query_string().to_string();

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            host = %host,
            method = %method,
            query_string = %query_string,
        );

        let fut = self.service.call(req);
        Box::pin(fut.instrument(span))
    }
}
