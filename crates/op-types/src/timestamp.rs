//! Unix timestamp utilities.
//!
//! [`UnixTimestamp`] is used for the `created` parameter of a `Signature-Input`
//! header (RFC 9421 §2.3) and for the derived expiry instant of an
//! [`AccessToken`](crate::grant::AccessToken).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Example
///
/// ```
/// use op_types::timestamp::UnixTimestamp;
///
/// let now = UnixTimestamp::now();
/// let expires = now + 3600;
/// assert_eq!(expires.as_secs(), now.as_secs() + 3600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0 + rhs)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on a properly configured system.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Whether this instant is at or before `now`.
    pub fn has_passed(&self, now: UnixTimestamp) -> bool {
        self.0 <= now.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_seconds() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        assert_eq!((ts + 3600).as_secs(), 1_700_003_600);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(UnixTimestamp::now().as_secs() > 1_577_836_800);
    }

    #[test]
    fn has_passed() {
        let past = UnixTimestamp::from_secs(100);
        let now = UnixTimestamp::from_secs(200);
        assert!(past.has_passed(now));
        assert!(!now.has_passed(past));
    }

    #[test]
    fn serializes_as_plain_integer() {
        let ts = UnixTimestamp::from_secs(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    }
}
