// Upstream build-tracking API module.
// Client and wire types for the Buildkite REST API.

pub mod client;
pub mod pages;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use crate::interval::Interval;
use crate::model::Build;

pub use client::BuildApiClient;
pub use types::{RateLimit, WireBuild};

/// Resolves one interval to its full list of passed builds, in upstream
/// order. The seam between the fetcher and the network.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch_interval(&self, interval: &Interval) -> Result<Vec<Build>>;
}
