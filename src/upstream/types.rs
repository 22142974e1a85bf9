// Upstream API response types.
// Wire shapes for deserializing Buildkite REST API responses.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::Build;

/// A build as returned by the upstream API.
///
/// Timestamps are optional on the wire; a running build has no
/// `finished_at`. We only ever query `state=passed`, so a missing timestamp
/// at mapping time is a precondition violation, not a normal case.
#[derive(Debug, Clone, Deserialize)]
pub struct WireBuild {
    pub id: String,
    pub branch: String,
    #[serde(default)]
    pub state: Option<String>,
    pub pipeline: WirePipeline,
    pub created_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Pipeline object embedded in a wire build.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePipeline {
    pub name: String,
}

impl WireBuild {
    /// Map into the compact internal record shape.
    pub fn into_build(self) -> Result<Build> {
        let WireBuild {
            id,
            branch,
            pipeline,
            created_at,
            scheduled_at,
            started_at,
            finished_at,
            ..
        } = self;

        let required = |ts: Option<DateTime<Utc>>, field: &'static str| {
            ts.ok_or_else(|| Error::MissingTimestamp {
                id: id.clone(),
                field,
            })
        };

        Ok(Build {
            created_at: required(created_at, "created_at")?,
            scheduled_at: required(scheduled_at, "scheduled_at")?,
            started_at: required(started_at, "started_at")?,
            finished_at: required(finished_at, "finished_at")?,
            pipeline: pipeline.name,
            branch,
            id,
        })
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until the limit window resets.
    pub reset: u64,
}
