// Upstream API HTTP client.
// Handles authentication, rate limit tracking, and paginated build listing.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT},
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::model::Build;

use super::UpstreamSource;
use super::pages::{drain_pages, parse_next_page};
use super::types::{RateLimit, WireBuild};

const API_BASE: &str = "https://api.buildkite.com/v2";
const PAGE_SIZE: u32 = 100;

/// Only terminal, successful builds are queried; this is what guarantees
/// every record carries all four timestamps.
const PASSED_STATE: &str = "passed";

/// Buildkite REST API client with authentication and rate limit tracking.
pub struct BuildApiClient {
    client: Client,
    org: String,
    rate_limit: Mutex<RateLimit>,
}

impl BuildApiClient {
    /// Create a new client for one organization with the given API token.
    /// The token needs `read_builds` permission.
    pub fn new(token: &str, org: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Other(e.to_string()))?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("buildstats"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(Error::Api)?;

        Ok(Self {
            client,
            org: org.to_string(),
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Create a client from the BUILDKITE_API_TOKEN environment variable.
    pub fn from_env(org: &str) -> Result<Self> {
        let token = std::env::var("BUILDKITE_API_TOKEN").map_err(|_| Error::MissingToken)?;
        Self::new(&token, org)
    }

    /// Snapshot of the most recently observed rate limit headers.
    pub fn rate_limit(&self) -> RateLimit {
        self.lock_rate_limit().clone()
    }

    /// Make a GET request with query parameters.
    async fn get_with_params<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        params: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", API_BASE, endpoint);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(Error::Api)?;

        self.update_rate_limit(&response);
        self.check_response(response).await
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &Response) {
        let mut rate_limit = self.lock_rate_limit();

        if let Some(limit) = response
            .headers()
            .get("RateLimit-Limit")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            rate_limit.limit = limit;
        }

        if let Some(remaining) = response
            .headers()
            .get("RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            rate_limit.remaining = remaining;
        }

        if let Some(reset) = response
            .headers()
            .get("RateLimit-Reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(Error::NotFound(url))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let reset = self.lock_rate_limit().reset;
                Err(Error::RateLimited {
                    reset_at: format!("in {}s", reset),
                })
            }
            status => Err(Error::Other(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            ))),
        }
    }

    /// Fetch one page of passed builds created within `interval`.
    /// Returns the mapped records and the next page number, if any.
    async fn list_builds_page(
        &self,
        interval: &Interval,
        page: u32,
    ) -> Result<(Vec<Build>, Option<u32>)> {
        let params = [
            ("page", page.to_string()),
            ("per_page", PAGE_SIZE.to_string()),
            ("state", PASSED_STATE.to_string()),
            ("created_from", interval.from.to_rfc3339()),
            ("created_to", interval.to.to_rfc3339()),
        ];
        let response = self
            .get_with_params(&format!("/organizations/{}/builds", self.org), &params)
            .await?;

        let next = parse_next_page(response.headers().get(LINK).and_then(|v| v.to_str().ok()));

        let wires: Vec<WireBuild> = response.json().await.map_err(Error::Api)?;
        debug!(%interval, page, records = wires.len(), "fetched upstream page");

        let builds = wires
            .into_iter()
            .map(WireBuild::into_build)
            .collect::<Result<Vec<_>>>()?;
        Ok((builds, next))
    }

    fn lock_rate_limit(&self) -> std::sync::MutexGuard<'_, RateLimit> {
        match self.rate_limit.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl UpstreamSource for BuildApiClient {
    async fn fetch_interval(&self, interval: &Interval) -> Result<Vec<Build>> {
        drain_pages(|page| self.list_builds_page(interval, page)).await
    }
}
