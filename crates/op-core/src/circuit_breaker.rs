//! A three-state (CLOSED/OPEN/HALF_OPEN) circuit breaker.
//!
//! All counters and the state live behind a single `Mutex`, so a state
//! transition observes and updates everything atomically: two threads can
//! never drive the breaker in opposite directions concurrently.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Raised by [`CircuitBreaker::guard`] when the breaker is fast-failing.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("circuit breaker is open")]
pub struct CircuitOpenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Static configuration for a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub threshold: u32,
    pub timeout: Duration,
    pub half_open_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout: Duration::from_secs(30),
            half_open_probes: 1,
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    in_flight_probes: u32,
    last_failure: Option<Instant>,
}

/// Tracks failures across calls to a base transport and fast-fails once a
/// failure threshold is reached.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                in_flight_probes: 0,
                last_failure: None,
            }),
        }
    }

    /// Current breaker state, for inspection/logging only.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    /// Whether a new call is allowed right now. OPEN transitions to
    /// HALF_OPEN (and allows one probe through) once `timeout` has elapsed
    /// since the last failure.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed_ok = inner
                    .last_failure
                    .is_none_or(|t| t.elapsed() >= self.config.timeout);
                if elapsed_ok {
                    inner.state = CircuitState::HalfOpen;
                    inner.in_flight_probes = 1;
                    inner.success_count = 0;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.in_flight_probes < self.config.half_open_probes {
                    inner.in_flight_probes += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.half_open_probes {
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    inner.in_flight_probes = 0;
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.threshold {
                    inner.state = CircuitState::Open;
                    inner.last_failure = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.last_failure = Some(Instant::now());
                inner.failure_count = self.config.threshold;
                inner.success_count = 0;
                inner.in_flight_probes = 0;
            }
            CircuitState::Open => {
                inner.last_failure = Some(Instant::now());
            }
        }
    }

    /// Convenience wrapper returning [`CircuitOpenError`] when a call would
    /// be fast-failed.
    pub fn guard(&self) -> Result<(), CircuitOpenError> {
        if self.allow_request() {
            Ok(())
        } else {
            Err(CircuitOpenError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, timeout: Duration, probes: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            threshold,
            timeout,
            half_open_probes: probes,
        })
    }

    #[test]
    fn closed_breaker_always_allows() {
        let b = breaker(3, Duration::from_secs(1), 1);
        assert!(b.allow_request());
        b.record_success();
        assert!(b.allow_request());
    }

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let b = breaker(3, Duration::from_secs(60), 1);
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.allow_request());
    }

    #[test]
    fn open_breaker_fast_fails_without_waiting_for_timeout() {
        let b = breaker(1, Duration::from_secs(60), 1);
        b.record_failure();
        assert!(matches!(b.guard(), Err(CircuitOpenError)));
    }

    #[test]
    fn half_open_after_timeout_elapses() {
        let b = breaker(1, Duration::from_millis(1), 1);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(b.allow_request());
        assert_eq!(b.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_closes_after_enough_successes() {
        let b = breaker(1, Duration::from_millis(1), 2);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(b.allow_request()); // probe 1, HalfOpen
        b.record_success();
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert!(b.allow_request()); // probe 2
        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_reopens_on_failure() {
        let b = breaker(1, Duration::from_millis(1), 2);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(b.allow_request());
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
    }

    #[test]
    fn reaching_half_open_probe_limit_denies_further_calls() {
        let b = breaker(1, Duration::from_millis(1), 1);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(b.allow_request()); // the single probe
        assert!(!b.allow_request()); // no more probes until resolved
    }
}
