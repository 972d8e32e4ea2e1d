//! Correlation propagation for outbound service calls
//!
//! The active request's correlation token travels downstream unless the
//! caller already set the header. Calls made outside any request simply
//! pass `None` and nothing is attached.

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, Response};
use serde::Deserialize;

use commons_core::{events, ConfigError, CorrelationId, DEFAULT_CORRELATION_HEADER};

/// Outbound propagation options
#[derive(Debug, Clone, Deserialize)]
pub struct PropagationConfig {
    /// Header carrying the token on outbound requests
    pub header: String,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_CORRELATION_HEADER.to_string(),
        }
    }
}

/// Inter-service HTTP client that forwards the correlation token
#[derive(Debug)]
pub struct ServiceClient {
    client: Client,
    header: HeaderName,
}

impl ServiceClient {
    pub fn new(config: PropagationConfig) -> Result<Self, ConfigError> {
        Self::with_client(Client::new(), config)
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: Client, config: PropagationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            header: parse_header_name(&config.header)?,
            client,
        })
    }

    /// Start building a request against `url`.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Attach the correlation token, unless the request already carries
    /// the header or no request context is active.
    pub fn propagate(&self, request: &mut Request, context: Option<&CorrelationId>) {
        if request.headers().contains_key(&self.header) {
            return;
        }
        if let Some(context) = context {
            if let Ok(value) = HeaderValue::from_str(context.as_str()) {
                request.headers_mut().insert(self.header.clone(), value);
            }
        }
    }

    /// Send `request` with the token attached, logging any non-success
    /// downstream status.
    pub async fn execute(
        &self,
        mut request: Request,
        context: Option<&CorrelationId>,
    ) -> Result<Response, reqwest::Error> {
        self.propagate(&mut request, context);

        let method = request.method().clone();
        let url = request.url().clone();
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            tracing::error!(
                category = events::API_CLIENT,
                method = %method,
                url = %url,
                status = response.status().as_u16(),
                "downstream call returned a non-success status"
            );
        }

        Ok(response)
    }

    /// GET `url` with the token attached.
    pub async fn get(
        &self,
        url: &str,
        context: Option<&CorrelationId>,
    ) -> Result<Response, reqwest::Error> {
        let request = self.client.get(url).build()?;
        self.execute(request, context).await
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyHeaderName);
    }
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ServiceClient {
        ServiceClient::new(PropagationConfig::default()).unwrap()
    }

    fn request() -> Request {
        Request::new(Method::GET, "http://localhost/downstream".parse().unwrap())
    }

    #[test]
    fn test_attaches_token_when_header_absent() {
        let service = client();
        let mut request = request();
        let id = CorrelationId::new("abc-123");

        service.propagate(&mut request, Some(&id));

        assert_eq!(request.headers().get("X-Correlation-ID").unwrap(), "abc-123");
    }

    #[test]
    fn test_keeps_caller_supplied_header() {
        let service = client();
        let mut request = request();
        request
            .headers_mut()
            .insert("X-Correlation-ID", HeaderValue::from_static("preset"));

        service.propagate(&mut request, Some(&CorrelationId::new("abc-123")));

        assert_eq!(request.headers().get("X-Correlation-ID").unwrap(), "preset");
    }

    #[test]
    fn test_noop_without_request_context() {
        let service = client();
        let mut request = request();

        service.propagate(&mut request, None);

        assert!(request.headers().get("X-Correlation-ID").is_none());
    }

    #[test]
    fn test_custom_header_name() {
        let service = ServiceClient::new(PropagationConfig {
            header: "X-Request-Token".to_string(),
        })
        .unwrap();
        let mut request = request();

        service.propagate(&mut request, Some(&CorrelationId::new("abc-123")));

        assert_eq!(request.headers().get("X-Request-Token").unwrap(), "abc-123");
    }

    #[test]
    fn test_empty_header_name_rejected() {
        let err = ServiceClient::new(PropagationConfig { header: "  ".into() }).unwrap_err();
        assert_eq!(err, ConfigError::EmptyHeaderName);
    }
}
