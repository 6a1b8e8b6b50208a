//! [`ReqwestTransport`]: the `reqwest::Client`-backed [`Transport`] impl.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use op_core::transport::{HttpRequest, HttpResponse, RequestInterceptor, ResponseInterceptor, Transport, TransportError};
use reqwest::{Method, Url};
use thiserror::Error;

/// Errors specific to building or sending a request through `reqwest`, all
/// folded into [`TransportError::Network`] at the `Transport` boundary.
#[derive(Debug, Error)]
pub enum ReqwestTransportError {
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),
    #[error("invalid request URI {0:?}")]
    InvalidUri(String),
    #[error("reqwest error")]
    Reqwest(#[from] reqwest::Error),
}

/// Adapts a `reqwest::Client` to the [`Transport`] trait.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    request_interceptors: Arc<Mutex<Vec<Arc<dyn RequestInterceptor>>>>,
    response_interceptors: Arc<Mutex<Vec<Arc<dyn ResponseInterceptor>>>>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            request_interceptors: Arc::new(Mutex::new(Vec::new())),
            response_interceptors: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[cfg_attr(feature = "telemetry", tracing::instrument(skip(self, request), fields(method = %request.method, uri = %request.uri)))]
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let request = self
            .request_interceptors
            .lock()
            .unwrap()
            .iter()
            .fold(request, |req, interceptor| interceptor.intercept(req));

        let method = Method::from_str(&request.method)
            .map_err(|_| ReqwestTransportError::InvalidMethod(request.method.clone()))
            .map_err(|e| TransportError::Network(Box::new(e)))?;
        let url = Url::parse(&request.uri)
            .map_err(|_| ReqwestTransportError::InvalidUri(request.uri.clone()))
            .map_err(|e| TransportError::Network(Box::new(e)))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(ReqwestTransportError::from)
            .map_err(|e| TransportError::Network(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(ReqwestTransportError::from)
            .map_err(|e| TransportError::Network(Box::new(e)))?
            .to_vec();

        #[cfg(feature = "telemetry")]
        tracing::debug!(status, "received response");

        let response = HttpResponse { status, headers, body };
        let response = self
            .response_interceptors
            .lock()
            .unwrap()
            .iter()
            .fold(response, |resp, interceptor| interceptor.intercept(resp));

        Ok(response)
    }

    async fn close(&self) {}

    fn add_request_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors.lock().unwrap().push(interceptor);
    }

    fn add_response_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors.lock().unwrap().push(interceptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds_a_plain_client() {
        let _transport = ReqwestTransport::default();
    }

    #[tokio::test]
    async fn invalid_method_surfaces_as_network_error() {
        let transport = ReqwestTransport::default();
        let request = HttpRequest::new("NOT A METHOD", "https://example.invalid");
        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn invalid_uri_surfaces_as_network_error() {
        let transport = ReqwestTransport::default();
        let request = HttpRequest::new("GET", "not a uri");
        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    struct BreakUriInterceptor;

    impl RequestInterceptor for BreakUriInterceptor {
        fn intercept(&self, mut request: HttpRequest) -> HttpRequest {
            request.uri = "not a uri".to_string();
            request
        }
    }

    #[tokio::test]
    async fn registered_request_interceptor_runs_before_send() {
        let transport = ReqwestTransport::default();
        transport.add_request_interceptor(Arc::new(BreakUriInterceptor));
        let request = HttpRequest::new("GET", "https://example.com");
        let err = transport.execute(request).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    struct NoopResponseInterceptor;

    impl ResponseInterceptor for NoopResponseInterceptor {
        fn intercept(&self, response: HttpResponse) -> HttpResponse {
            response
        }
    }

    #[test]
    fn response_interceptor_registers_without_panicking() {
        let transport = ReqwestTransport::default();
        transport.add_response_interceptor(Arc::new(NoopResponseInterceptor));
        assert_eq!(transport.response_interceptors.lock().unwrap().len(), 1);
    }
}
