// Cache lifetime policy.
// Maps an interval's age to a TTL, with jitter on the long tier.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::interval::Interval;

/// Intervals ending more than this many hours in the past are historically
/// stable.
const STABLE_AGE_HOURS: i64 = 12;
/// Intervals ending more than this many hours in the past are probably
/// finalized.
const SETTLED_AGE_HOURS: i64 = 1;

/// TTL for stable intervals, before jitter: 60 days.
const LONG_TTL_SECS: u64 = 60 * 24 * 60 * 60;
/// Jitter ceiling for stable intervals, in minutes: 20 days.
const JITTER_CEILING_MINUTES: u64 = 20 * 24 * 60;
/// TTL for settled-but-recent intervals: 2 hours.
const MEDIUM_TTL_SECS: u64 = 2 * 60 * 60;
/// TTL for intervals still receiving builds: 10 minutes.
const SHORT_TTL_SECS: u64 = 10 * 60;

/// Three-tier staleness policy for interval cache entries.
///
/// Old build data never changes, so stable intervals get a long TTL. Writing
/// them all with an identical TTL would make them expire together and
/// re-fetch as one burst, so the long tier adds uniform random jitter of up
/// to 20 days. The random source is owned by the policy instance; seed it
/// for deterministic tests.
pub struct TtlPolicy {
    rng: Mutex<StdRng>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A policy with deterministic jitter.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// TTL for a cache entry covering `interval`, written at `now`.
    pub fn ttl_for(&self, interval: &Interval, now: DateTime<Utc>) -> Duration {
        let age = now - interval.to;
        if age > chrono::Duration::hours(STABLE_AGE_HOURS) {
            let jitter_minutes = self.lock_rng().gen_range(0..JITTER_CEILING_MINUTES);
            Duration::from_secs(LONG_TTL_SECS + jitter_minutes * 60)
        } else if age > chrono::Duration::hours(SETTLED_AGE_HOURS) {
            Duration::from_secs(MEDIUM_TTL_SECS)
        } else {
            Duration::from_secs(SHORT_TTL_SECS)
        }
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new()
    }
}
