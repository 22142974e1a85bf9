//! Time-windowed, TTL-tiered caching for Buildkite build history.
//!
//! Reporting code asks for "all passed builds since `from`" via
//! [`BuildSource::list_builds`]; this crate splits the range into
//! calendar-aligned hourly chunks, serves each chunk from a
//! [`ChunkStore`] when possible, and fetches the rest from the upstream
//! API under a bounded worker pool. Chunk lifetimes come from a
//! three-tier staleness policy, with jitter on the long tier so old
//! entries don't expire as one burst.
//!
//! ```no_run
//! use std::sync::Arc;
//! use buildstats::{BuildApiClient, BuildSource, CachedFetcher, FsStore, PatternFilter};
//!
//! # async fn example() -> buildstats::Result<()> {
//! let client = Arc::new(BuildApiClient::from_env("my-org")?);
//! let store = Arc::new(FsStore::new()?);
//! let fetcher = CachedFetcher::new(client, store);
//!
//! let from = chrono::Utc::now() - chrono::Duration::weeks(4);
//! let filter = PatternFilter::new(".*", "^master$")?;
//! let builds = fetcher.list_builds(from, &filter).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fetcher;
pub mod interval;
pub mod model;
pub mod predicate;
pub mod query;
pub mod stats;
pub mod store;
pub mod ttl;
pub mod upstream;

pub use error::{Error, Result, StoreError};
pub use fetcher::{BuildSource, CachedFetcher};
pub use interval::Interval;
pub use model::{Build, BuildTimestamp};
pub use predicate::{BuildPredicate, MatchAll, PatternFilter};
pub use query::Query;
pub use store::{ChunkStore, FsStore, MemoryStore};
pub use ttl::TtlPolicy;
pub use upstream::{BuildApiClient, UpstreamSource};
