//! Retry delay strategies.
//!
//! A [`RetryStrategy`] is a pure function of attempt number to delay, except
//! for [`DecorrelatedJitter`] which holds per-strategy state that must stay
//! correct under concurrent use.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use rand::rngs::ThreadRng;

/// Computes the delay to wait before retry attempt `n` (1-indexed).
pub trait RetryStrategy: Send + Sync {
    fn calculate_delay(&self, attempt: u32) -> Duration;
}

/// Always waits the same fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl RetryStrategy for FixedDelay {
    fn calculate_delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Waits `n * base` for attempt `n`.
#[derive(Debug, Clone, Copy)]
pub struct LinearDelay(pub Duration);

impl RetryStrategy for LinearDelay {
    fn calculate_delay(&self, attempt: u32) -> Duration {
        self.0 * attempt
    }
}

/// Waits `2^(n-1) * base` for attempt `n`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialDelay(pub Duration);

impl ExponentialDelay {
    fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.0 * (1u32 << exponent)
    }
}

impl RetryStrategy for ExponentialDelay {
    fn calculate_delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt)
    }
}

/// Exponential backoff with full jitter: `uniform(0, exponential(n))`.
#[derive(Debug, Clone, Copy)]
pub struct FullJitter(pub ExponentialDelay);

impl RetryStrategy for FullJitter {
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let max = self.0.base_delay(attempt);
        random_duration_up_to(max)
    }
}

/// Exponential backoff with equal jitter: `exponential(n)/2 +
/// uniform(0, exponential(n)/2)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualJitter(pub ExponentialDelay);

impl RetryStrategy for EqualJitter {
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base = self.0.base_delay(attempt);
        let half = base / 2;
        half + random_duration_up_to(half)
    }
}

/// Decorrelated jitter: `uniform(base, 3 * previous)`, where `previous`
/// starts at `base` and is updated after every call. Safe under concurrent
/// use via an atomic swap.
#[derive(Debug)]
pub struct DecorrelatedJitter {
    base_ms: u64,
    previous_ms: AtomicU64,
}

impl DecorrelatedJitter {
    pub fn new(base: Duration) -> Self {
        let base_ms = base.as_millis().max(1) as u64;
        Self {
            base_ms,
            previous_ms: AtomicU64::new(base_ms),
        }
    }
}

impl RetryStrategy for DecorrelatedJitter {
    fn calculate_delay(&self, _attempt: u32) -> Duration {
        let previous = self.previous_ms.load(Ordering::Acquire);
        let upper = previous.saturating_mul(3).max(self.base_ms + 1);
        let next_ms = rand::rng().random_range(self.base_ms..upper);
        self.previous_ms.store(next_ms, Ordering::Release);
        Duration::from_millis(next_ms)
    }
}

fn random_duration_up_to(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let ms: u64 = ThreadRng::default().random_range(0..=max_ms);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_is_constant() {
        let s = FixedDelay(Duration::from_millis(100));
        assert_eq!(s.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(s.calculate_delay(5), Duration::from_millis(100));
    }

    #[test]
    fn linear_delay_scales_with_attempt() {
        let s = LinearDelay(Duration::from_millis(100));
        assert_eq!(s.calculate_delay(3), Duration::from_millis(300));
    }

    #[test]
    fn exponential_delay_matches_formula_for_n_in_1_to_20() {
        let s = ExponentialDelay(Duration::from_millis(100));
        for n in 1..=20u32 {
            let expected = Duration::from_millis(100 * 2u64.pow(n - 1));
            assert_eq!(s.calculate_delay(n), expected);
        }
    }

    #[test]
    fn full_jitter_output_bounded_by_base_delay() {
        let s = FullJitter(ExponentialDelay(Duration::from_millis(100)));
        for _ in 0..50 {
            let d = s.calculate_delay(3); // base = 400ms
            assert!(d <= Duration::from_millis(400));
        }
    }

    #[test]
    fn equal_jitter_output_bounded_between_half_and_full() {
        let s = EqualJitter(ExponentialDelay(Duration::from_millis(100)));
        for _ in 0..50 {
            let d = s.calculate_delay(3); // base = 400ms
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(400));
        }
    }

    #[test]
    fn decorrelated_jitter_stays_within_bounds_and_updates_state() {
        let s = DecorrelatedJitter::new(Duration::from_millis(100));
        let mut previous = Duration::from_millis(100);
        for _ in 0..20 {
            let d = s.calculate_delay(0);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= previous * 3);
            previous = d;
        }
    }
}
