// Build-time statistics.
// Aggregations over record sets for the reporting layer: totals,
// percentiles, and per-pipeline timelines. Rendering happens elsewhere.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::model::Build;
use crate::query::Query;

/// A pipeline name with an aggregated duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDuration {
    pub name: String,
    pub duration: Duration,
}

/// One point on a pipeline's build-time timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSample {
    pub when: DateTime<Utc>,
    pub duration: Duration,
}

/// Total time spent per pipeline, longest first.
pub fn total_durations(builds: &[Build], query: &Query) -> Vec<NamedDuration> {
    let mut sums: HashMap<&str, Duration> = HashMap::new();
    for build in builds {
        let entry = sums.entry(&build.pipeline).or_insert_with(Duration::zero);
        *entry += query.duration(build);
    }
    sorted_descending(sums)
}

/// Per-pipeline duration percentile (e.g. 0.9 for p90), largest first.
pub fn percentile_durations(builds: &[Build], query: &Query, percentile: f64) -> Vec<NamedDuration> {
    let mut by_pipeline: HashMap<&str, Vec<Duration>> = HashMap::new();
    for build in builds {
        by_pipeline
            .entry(&build.pipeline)
            .or_default()
            .push(query.duration(build));
    }

    let quantiles: HashMap<&str, Duration> = by_pipeline
        .into_iter()
        .filter_map(|(name, durations)| {
            duration_percentile(&durations, percentile).map(|d| (name, d))
        })
        .collect();
    sorted_descending(quantiles)
}

/// The `percentile`-quantile of a duration sample, by nearest-rank on the
/// sorted sample. None for an empty sample.
pub fn duration_percentile(durations: &[Duration], percentile: f64) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let mut sorted = durations.to_vec();
    sorted.sort();

    let clamped = percentile.clamp(0.0, 1.0);
    let element = ((sorted.len() - 1) as f64 * clamped).round() as usize;
    Some(sorted[element])
}

/// Timeline of one pipeline's build durations, ordered by build timestamp.
pub fn timeline(builds: &[Build], query: &Query, pipeline: &str) -> Vec<TimelineSample> {
    let mut samples: Vec<TimelineSample> = builds
        .iter()
        .filter(|b| b.pipeline == pipeline)
        .map(|b| TimelineSample {
            when: query.when(b),
            duration: query.duration(b),
        })
        .collect();
    samples.sort_by_key(|s| s.when);
    samples
}

/// Rolling mean over the trailing `window` samples, one output per input.
pub fn rolling_average(samples: &[TimelineSample], window: usize) -> Vec<TimelineSample> {
    if window == 0 {
        return Vec::new();
    }
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let start = (i + 1).saturating_sub(window);
            let recent = &samples[start..=i];
            let sum_ms: i64 = recent.iter().map(|s| s.duration.num_milliseconds()).sum();
            TimelineSample {
                when: sample.when,
                duration: Duration::milliseconds(sum_ms / recent.len() as i64),
            }
        })
        .collect()
}

fn sorted_descending(map: HashMap<&str, Duration>) -> Vec<NamedDuration> {
    let mut list: Vec<NamedDuration> = map
        .into_iter()
        .map(|(name, duration)| NamedDuration {
            name: name.to_string(),
            duration,
        })
        .collect();
    list.sort_by(|a, b| b.duration.cmp(&a.duration).then_with(|| a.name.cmp(&b.name)));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn build(pipeline: &str, started_min: u32, run_minutes: i64) -> Build {
        let started = Utc
            .with_ymd_and_hms(2024, 3, 1, 10, started_min, 0)
            .unwrap();
        Build {
            id: format!("{pipeline}-{started_min}"),
            pipeline: pipeline.to_string(),
            branch: "master".to_string(),
            created_at: started - Duration::minutes(2),
            scheduled_at: started - Duration::minutes(1),
            started_at: started,
            finished_at: started + Duration::minutes(run_minutes),
        }
    }

    fn query() -> Query {
        Query::parse(r#"{"name": "t", "from": "started", "to": "finished"}"#).unwrap()
    }

    #[test]
    fn test_total_durations_sums_and_sorts() {
        let builds = vec![
            build("api", 0, 10),
            build("api", 15, 20),
            build("web", 30, 5),
        ];
        let totals = total_durations(&builds, &query());
        assert_eq!(
            totals,
            vec![
                NamedDuration {
                    name: "api".to_string(),
                    duration: Duration::minutes(30)
                },
                NamedDuration {
                    name: "web".to_string(),
                    duration: Duration::minutes(5)
                },
            ]
        );
    }

    #[test]
    fn test_duration_percentile_nearest_rank() {
        let durations: Vec<Duration> = (1..=10).map(Duration::minutes).collect();
        // round((10-1) * 0.9) = 8 → ninth element.
        assert_eq!(
            duration_percentile(&durations, 0.9),
            Some(Duration::minutes(9))
        );
        assert_eq!(
            duration_percentile(&durations, 0.0),
            Some(Duration::minutes(1))
        );
        assert_eq!(
            duration_percentile(&durations, 1.0),
            Some(Duration::minutes(10))
        );
        assert_eq!(duration_percentile(&[], 0.5), None);
    }

    #[test]
    fn test_percentile_durations_per_pipeline() {
        let mut builds: Vec<Build> = (0..10).map(|i| build("api", i, (i + 1) as i64)).collect();
        builds.push(build("web", 40, 3));

        let p90 = percentile_durations(&builds, &query(), 0.9);
        assert_eq!(p90.len(), 2);
        assert_eq!(p90[0].name, "api");
        assert_eq!(p90[0].duration, Duration::minutes(9));
        assert_eq!(p90[1].name, "web");
        assert_eq!(p90[1].duration, Duration::minutes(3));
    }

    #[test]
    fn test_timeline_filters_and_orders() {
        let builds = vec![
            build("api", 30, 4),
            build("web", 10, 9),
            build("api", 5, 6),
        ];
        let samples = timeline(&builds, &query(), "api");
        assert_eq!(samples.len(), 2);
        assert!(samples[0].when < samples[1].when);
        assert_eq!(samples[0].duration, Duration::minutes(6));
        assert_eq!(samples[1].duration, Duration::minutes(4));
    }

    #[test]
    fn test_rolling_average_windows() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let samples: Vec<TimelineSample> = [2, 4, 6, 8]
            .iter()
            .enumerate()
            .map(|(i, m)| TimelineSample {
                when: base + Duration::minutes(i as i64),
                duration: Duration::minutes(*m),
            })
            .collect();

        let averaged = rolling_average(&samples, 2);
        let minutes: Vec<i64> = averaged.iter().map(|s| s.duration.num_minutes()).collect();
        // [2], [2,4], [4,6], [6,8]
        assert_eq!(minutes, vec![2, 3, 5, 7]);

        // A window wider than the sample set averages everything seen so far.
        let averaged = rolling_average(&samples, 100);
        assert_eq!(averaged[3].duration, Duration::minutes(5));
    }
}
