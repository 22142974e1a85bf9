// Time range partitioning.
// Splits a query range into fixed-size, calendar-aligned cache windows.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};

/// A half-open time window `[from, to)`, the unit of caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Interval {
    /// Store key for this interval. Anchored chunking keeps these stable
    /// across queries whose `from` drifts (e.g. "now minus 4 weeks").
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.from.timestamp(), self.to.timestamp())
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

/// Partition `[from, to)` into contiguous chunks of `chunk` duration,
/// anchored at local-time midnight of `from`'s calendar day.
///
/// The union of the returned intervals is a superset of `[from, to)`: the
/// first interval may start before `from` and the last may end after `to`.
/// Intervals are generated while their start is before `to`.
pub fn generate_intervals(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    chunk: Duration,
) -> Vec<Interval> {
    if chunk <= Duration::zero() {
        return Vec::new();
    }

    let mut start = day_start(from.with_timezone(&Local).date_naive());
    let mut end = start + chunk;

    let mut res = Vec::new();
    while start < to {
        res.push(Interval { from: start, to: end });
        start = end;
        end += chunk;
    }
    res
}

/// Local midnight of `day`, as a UTC instant.
fn day_start(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // Midnight fell in a DST gap; the day starts when clocks resume.
        LocalResult::None => Local
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour() -> Duration {
        Duration::hours(1)
    }

    #[test]
    fn test_cache_key_uses_unix_seconds() {
        let interval = Interval {
            from: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            to: Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
        };
        assert_eq!(interval.cache_key(), "1700000000-1700003600");
    }

    #[test]
    fn test_union_is_superset_of_requested_range() {
        let to = Utc::now();
        let from = to - Duration::hours(27);
        let intervals = generate_intervals(from, to, hour());

        assert!(!intervals.is_empty());
        assert!(intervals.first().unwrap().from <= from);
        assert!(intervals.last().unwrap().to >= to);
    }

    #[test]
    fn test_intervals_are_contiguous_ordered_and_fixed_size() {
        let to = Utc::now();
        let from = to - Duration::days(3);
        let intervals = generate_intervals(from, to, hour());

        for w in intervals.windows(2) {
            assert_eq!(w[0].to, w[1].from);
        }
        for interval in &intervals {
            assert_eq!(interval.to - interval.from, hour());
            assert!(interval.from < interval.to);
        }
    }

    #[test]
    fn test_last_interval_starts_before_to() {
        let to = Utc::now();
        let from = to - Duration::hours(5);
        let intervals = generate_intervals(from, to, hour());
        assert!(intervals.last().unwrap().from < to);
    }

    #[test]
    fn test_stable_keys_for_drifting_from() {
        // Two queries a few seconds apart must produce identical chunks.
        let to = Utc::now();
        let a = generate_intervals(to - Duration::hours(8), to, hour());
        let b = generate_intervals(to - Duration::hours(8) + Duration::seconds(30), to, hour());
        let keys_a: Vec<_> = a.iter().map(Interval::cache_key).collect();
        let keys_b: Vec<_> = b.iter().map(Interval::cache_key).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        let now = Utc::now();
        assert!(generate_intervals(now, now - Duration::hours(1), hour()).is_empty());
    }

    #[test]
    fn test_non_positive_chunk_yields_nothing() {
        let now = Utc::now();
        let from = now - Duration::hours(2);
        assert!(generate_intervals(from, now, Duration::zero()).is_empty());
        assert!(generate_intervals(from, now, Duration::seconds(-5)).is_empty());
    }
}
