// Report queries.
// JSON report definitions turned into predicates and duration extractors.

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{Build, BuildTimestamp};
use crate::predicate::{BuildPredicate, compile};

/// Raw JSON shape of a report definition, e.g.
/// `{"name": "Slow master builds", "from": "started", "to": "finished",
///   "pipelines": ".*", "branches": "master"}`.
#[derive(Debug, Deserialize)]
struct QueryDef {
    name: String,
    from: String,
    to: String,
    pipelines: Option<String>,
    branches: Option<String>,
}

/// A parsed report query: which builds to include and which pair of
/// timestamps defines each build's duration. Builds are grouped by
/// pipeline name downstream.
pub struct Query {
    pub name: String,
    from: BuildTimestamp,
    to: BuildTimestamp,
    pipelines: Regex,
    branches: Regex,
}

impl Query {
    /// Parse a JSON report definition. Missing pipeline/branch patterns
    /// default to matching everything.
    pub fn parse(json: &str) -> Result<Self> {
        let def: QueryDef = serde_json::from_str(json)
            .map_err(|e| Error::InvalidQuery(format!("unable to parse report: {e}")))?;

        Ok(Self {
            from: def.from.parse()?,
            to: def.to.parse()?,
            pipelines: compile(def.pipelines.as_deref().unwrap_or(".*"))?,
            branches: compile(def.branches.as_deref().unwrap_or(".*"))?,
            name: def.name,
        })
    }

    /// The duration this report measures for one build.
    pub fn duration(&self, build: &Build) -> chrono::Duration {
        self.to.extract(build) - self.from.extract(build)
    }

    /// The timestamp a build is plotted at.
    pub fn when(&self, build: &Build) -> chrono::DateTime<chrono::Utc> {
        self.from.extract(build)
    }
}

impl BuildPredicate for Query {
    fn matches(&self, build: &Build) -> bool {
        self.pipelines.is_match(&build.pipeline) && self.branches.is_match(&build.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn build() -> Build {
        Build {
            id: "b".to_string(),
            pipeline: "backend".to_string(),
            branch: "master".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            scheduled_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 30).unwrap(),
            started_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 2, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 12, 0).unwrap(),
        }
    }

    #[test]
    fn test_parse_full_definition() {
        let query = Query::parse(
            r#"{"name": "Slow master builds", "from": "started", "to": "finished",
                "pipelines": "^back", "branches": "^master$"}"#,
        )
        .unwrap();

        assert_eq!(query.name, "Slow master builds");
        assert!(query.matches(&build()));
        assert_eq!(query.duration(&build()), chrono::Duration::minutes(10));
        assert_eq!(query.when(&build()), build().started_at);
    }

    #[test]
    fn test_missing_patterns_match_everything() {
        let query =
            Query::parse(r#"{"name": "All", "from": "created", "to": "finished"}"#).unwrap();
        assert!(query.matches(&build()));
        assert_eq!(query.duration(&build()), chrono::Duration::minutes(12));
    }

    #[test]
    fn test_unknown_timestamp_is_an_error() {
        let res = Query::parse(r#"{"name": "x", "from": "queued", "to": "finished"}"#);
        assert!(matches!(res, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_bad_regex_is_an_error() {
        let res = Query::parse(
            r#"{"name": "x", "from": "created", "to": "finished", "pipelines": "("}"#,
        );
        assert!(matches!(res, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Query::parse("{not json"),
            Err(Error::InvalidQuery(_))
        ));
    }
}
