//! A retry + circuit breaker decorator over a base [`Transport`], the same
//! way a `reqwest_middleware`-based client wraps a base `reqwest::Client`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitOpenError};
use crate::retry::RetryStrategy;
use crate::transport::{HttpRequest, HttpResponse, RequestInterceptor, ResponseInterceptor, Transport, TransportError};

/// Configuration for [`ResilientTransport`].
pub struct ResilientTransportConfig {
    pub max_retries: u32,
    pub retry_strategy: Arc<dyn RetryStrategy>,
    pub max_retry_delay: Duration,
    pub retry_on: Vec<u16>,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl ResilientTransportConfig {
    /// `retry_on` defaults to the usual retryable set `{408, 429, 500, 502, 503, 504}`.
    pub fn new(retry_strategy: Arc<dyn RetryStrategy>) -> Self {
        Self {
            max_retries: 3,
            retry_strategy,
            max_retry_delay: Duration::from_secs(30),
            retry_on: vec![408, 429, 500, 502, 503, 504],
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// Wraps a base [`Transport`] `T` with retries and an optional circuit
/// breaker.
pub struct ResilientTransport<T: Transport> {
    base: T,
    config: ResilientTransportConfig,
    breaker: Option<CircuitBreaker>,
}

impl<T: Transport> ResilientTransport<T> {
    pub fn new(base: T, config: ResilientTransportConfig) -> Self {
        let breaker = config.circuit_breaker.map(CircuitBreaker::new);
        Self { base, config, breaker }
    }

    fn is_retryable(&self, response: &HttpResponse) -> bool {
        self.config.retry_on.contains(&response.status)
    }
}

#[async_trait]
impl<T: Transport> Transport for ResilientTransport<T> {
    #[cfg_attr(feature = "telemetry", tracing::instrument(skip(self, request), fields(method = %request.method, uri = %request.uri)))]
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(breaker) = &self.breaker {
            if !breaker.allow_request() {
                #[cfg(feature = "telemetry")]
                tracing::warn!("circuit breaker open, fast-failing request");
                return Err(TransportError::CircuitOpen(CircuitOpenError));
            }
        }

        let mut attempt = 0u32;
        loop {
            let result = self.base.execute(request.clone()).await;

            match result {
                Ok(response) if response.is_success() || !self.is_retryable(&response) => {
                    if let Some(breaker) = &self.breaker {
                        breaker.record_success();
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    if let Some(breaker) = &self.breaker {
                        breaker.record_failure();
                    }
                    #[cfg(feature = "telemetry")]
                    tracing::warn!(status = response.status, attempt, "retryable response");
                    if attempt >= self.config.max_retries {
                        return Ok(response);
                    }
                }
                Err(err) => {
                    if let Some(breaker) = &self.breaker {
                        breaker.record_failure();
                    }
                    #[cfg(feature = "telemetry")]
                    tracing::error!(attempt, "transport error");
                    if attempt >= self.config.max_retries {
                        return Err(err);
                    }
                }
            }

            attempt += 1;
            let delay = self
                .config
                .retry_strategy
                .calculate_delay(attempt)
                .min(self.config.max_retry_delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn close(&self) {
        self.base.close().await;
    }

    fn add_request_interceptor(&self, interceptor: Arc<dyn RequestInterceptor>) {
        self.base.add_request_interceptor(interceptor);
    }

    fn add_response_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.base.add_response_interceptor(interceptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use crate::retry::FixedDelay;

    struct ScriptedTransport {
        responses: Mutex<Vec<Result<u16, ()>>>,
        calls: AtomicU32,
        request_interceptors_added: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<u16>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).rev().collect()),
                calls: AtomicU32::new(0),
                request_interceptors_added: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let status = self.responses.lock().unwrap().pop().expect("script exhausted").unwrap();
            Ok(HttpResponse { status, headers: Default::default(), body: vec![] })
        }

        async fn close(&self) {}

        fn add_request_interceptor(&self, _interceptor: Arc<dyn RequestInterceptor>) {
            self.request_interceptors_added.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(max_retries: u32) -> ResilientTransportConfig {
        let mut cfg = ResilientTransportConfig::new(Arc::new(FixedDelay(Duration::from_millis(1))));
        cfg.max_retries = max_retries;
        cfg.circuit_breaker = None;
        cfg
    }

    #[tokio::test]
    async fn succeeds_immediately_on_2xx() {
        let base = ScriptedTransport::new(vec![200]);
        let transport = ResilientTransport::new(base, config(2));
        let resp = transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.base.call_count(), 1);
    }

    #[tokio::test]
    async fn retries_on_500_then_succeeds() {
        let base = ScriptedTransport::new(vec![500, 500, 200]);
        let transport = ResilientTransport::new(base, config(2));
        let resp = transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(transport.base.call_count(), 3);
    }

    #[tokio::test]
    async fn surfaces_last_response_once_retries_exhausted() {
        let base = ScriptedTransport::new(vec![500, 500, 500]);
        let transport = ResilientTransport::new(base, config(2));
        let resp = transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap();
        assert_eq!(resp.status, 500);
        assert_eq!(transport.base.call_count(), 3);
    }

    #[tokio::test]
    async fn non_retryable_status_passes_through_without_retry() {
        let base = ScriptedTransport::new(vec![404]);
        let transport = ResilientTransport::new(base, config(2));
        let resp = transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(transport.base.call_count(), 1);
    }

    #[tokio::test]
    async fn open_circuit_breaker_fails_fast_without_calling_base() {
        let base = ScriptedTransport::new(vec![500, 500, 500, 500, 500]);
        let mut cfg = config(0);
        cfg.circuit_breaker = Some(CircuitBreakerConfig {
            threshold: 3,
            timeout: Duration::from_secs(60),
            half_open_probes: 1,
        });
        let transport = ResilientTransport::new(base, cfg);
        for _ in 0..3 {
            transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap();
        }
        let err = transport.execute(HttpRequest::new("GET", "https://ex.com")).await.unwrap_err();
        assert!(matches!(err, TransportError::CircuitOpen(_)));
        assert_eq!(transport.base.call_count(), 3);
    }

    struct NoopRequestInterceptor;

    impl RequestInterceptor for NoopRequestInterceptor {
        fn intercept(&self, request: HttpRequest) -> HttpRequest {
            request
        }
    }

    #[tokio::test]
    async fn add_request_interceptor_forwards_to_base() {
        let base = ScriptedTransport::new(vec![200]);
        let transport = ResilientTransport::new(base, config(0));
        transport.add_request_interceptor(Arc::new(NoopRequestInterceptor));
        assert_eq!(transport.base.request_interceptors_added.load(Ordering::SeqCst), 1);
    }
}
