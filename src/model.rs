// Internal build record types.
// The compact shape cached and handed to reporting code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed build, immutable once fetched.
///
/// Only builds in the terminal "passed" state are ever requested from the
/// upstream API, so all four timestamps are present. Callers computing
/// durations rely on `created ≤ scheduled ≤ started ≤ finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Upstream-assigned unique identifier.
    pub id: String,
    /// Pipeline name.
    pub pipeline: String,
    /// Branch the build ran on.
    pub branch: String,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Build {
    /// Wall-clock run time, from start to finish.
    pub fn run_duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Selector for one of a build's four timestamps.
///
/// Report definitions name these in lowercase ("created", "started", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTimestamp {
    Created,
    Scheduled,
    Started,
    Finished,
}

impl BuildTimestamp {
    pub fn extract(&self, build: &Build) -> DateTime<Utc> {
        match self {
            BuildTimestamp::Created => build.created_at,
            BuildTimestamp::Scheduled => build.scheduled_at,
            BuildTimestamp::Started => build.started_at,
            BuildTimestamp::Finished => build.finished_at,
        }
    }
}

impl std::str::FromStr for BuildTimestamp {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(BuildTimestamp::Created),
            "scheduled" => Ok(BuildTimestamp::Scheduled),
            "started" => Ok(BuildTimestamp::Started),
            "finished" => Ok(BuildTimestamp::Finished),
            other => Err(crate::error::Error::InvalidQuery(format!(
                "unknown timestamp {other:?}, expected created, scheduled, started or finished"
            ))),
        }
    }
}
