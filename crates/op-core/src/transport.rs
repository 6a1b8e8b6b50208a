//! The `Transport` capability trait: a transport-agnostic request/response
//! model plus the interceptor extension points, modeled on the way
//! `reqwest_middleware::Middleware` wraps a base HTTP client.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::circuit_breaker::CircuitOpenError;

/// Errors a [`Transport`] can raise executing a request: a base transport's
/// own failures, plus the circuit breaker's fast-fail, which a
/// [`crate::resilient::ResilientTransport`] may add atop any base.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport failed to reach the remote host")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("request was cancelled")]
    Cancelled,
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpenError),
}

/// A transport-agnostic outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A transport-agnostic inbound HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether `status` is in the default retryable set `{408, 429, 500,
    /// 502, 503, 504}`.
    pub fn is_default_retryable(&self) -> bool {
        matches!(self.status, 408 | 429 | 500 | 502 | 503 | 504)
    }
}

/// A hook invoked before a request is sent or after a response is received.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: HttpRequest) -> HttpRequest;
}

pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, response: HttpResponse) -> HttpResponse;
}

/// The capability a base HTTP client (or a decorator like
/// [`crate::resilient::ResilientTransport`]) must provide.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response, or a [`TransportError`] if
    /// the remote host could not be reached.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Releases any held resources (connection pools, background tasks).
    async fn close(&self);

    /// Registers a hook to run on every outgoing request before it is sent.
    /// The default implementation is a no-op; a base transport that wants
    /// this capability (e.g. [`crate::resilient::ResilientTransport`]
    /// forwarding to its base, or a real HTTP adapter) overrides it.
    fn add_request_interceptor(&self, _interceptor: Arc<dyn RequestInterceptor>) {}

    /// Registers a hook to run on every incoming response before it is
    /// returned to the caller. See [`Self::add_request_interceptor`].
    fn add_response_interceptor(&self, _interceptor: Arc<dyn ResponseInterceptor>) {}
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}
