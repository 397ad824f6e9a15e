//! Age-based trust decay for cached catalog results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Re-fetch is skipped inside this window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
/// Entries older than this are served but flagged stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(14 * 24 * 60 * 60);
/// Entries older than this are never served.
pub const DEFAULT_EXPIRE_AFTER: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// How far a cache entry can be trusted at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Younger than the TTL: serve without fetching.
    Fresh,
    /// Past the TTL: refetch, fall back to it on failure.
    Usable,
    /// Usable, but annotated `is_stale`.
    Stale,
    /// Past the hard ceiling: treated as absent.
    Expired,
}

impl Freshness {
    pub fn is_servable(self) -> bool {
        !matches!(self, Freshness::Expired)
    }

    pub fn is_stale(self) -> bool {
        matches!(self, Freshness::Stale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub stale_after: Duration,
    pub expire_after: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            stale_after: DEFAULT_STALE_AFTER,
            expire_after: DEFAULT_EXPIRE_AFTER,
        }
    }
}

impl CachePolicy {
    pub fn new(ttl: Duration, stale_after: Duration, expire_after: Duration) -> Self {
        Self {
            ttl,
            stale_after,
            expire_after,
        }
    }

    /// Classify an entry last refreshed at `last_success`.
    ///
    /// Timestamps in the future (clock skew) count as fresh.
    pub fn classify(&self, last_success: DateTime<Utc>, now: DateTime<Utc>) -> Freshness {
        let Ok(age) = (now - last_success).to_std() else {
            return Freshness::Fresh;
        };
        if age > self.expire_after {
            Freshness::Expired
        } else if age > self.stale_after {
            Freshness::Stale
        } else if age < self.ttl {
            Freshness::Fresh
        } else {
            Freshness::Usable
        }
    }

    /// Whether something stamped at `at` still falls inside the TTL window.
    pub fn within_ttl(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.classify(at, now) == Freshness::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn classify_age(age: TimeDelta) -> Freshness {
        let now = Utc::now();
        CachePolicy::default().classify(now - age, now)
    }

    #[test]
    fn test_default_thresholds() {
        assert_eq!(classify_age(TimeDelta::minutes(9)), Freshness::Fresh);
        assert_eq!(classify_age(TimeDelta::minutes(10)), Freshness::Usable);
        assert_eq!(classify_age(TimeDelta::days(2)), Freshness::Usable);
        assert_eq!(classify_age(TimeDelta::days(14)), Freshness::Usable);
        assert_eq!(classify_age(TimeDelta::days(20)), Freshness::Stale);
        assert_eq!(classify_age(TimeDelta::days(30)), Freshness::Stale);
        assert_eq!(classify_age(TimeDelta::days(31)), Freshness::Expired);
    }

    #[test]
    fn test_future_timestamps_are_fresh() {
        assert_eq!(classify_age(TimeDelta::minutes(-5)), Freshness::Fresh);
    }

    #[test]
    fn test_custom_policy() {
        let policy = CachePolicy::new(
            Duration::from_secs(1),
            Duration::from_secs(10),
            Duration::from_secs(20),
        );
        let now = Utc::now();
        assert_eq!(
            policy.classify(now - TimeDelta::seconds(15), now),
            Freshness::Stale
        );
        assert!(!policy
            .classify(now - TimeDelta::seconds(21), now)
            .is_servable());
    }
}
