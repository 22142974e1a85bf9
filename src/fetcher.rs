// Cached build fetching.
// Resolves a time range to build records through the chunk store, fanning
// missing intervals out to the upstream API under a bounded worker pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::interval::{Interval, generate_intervals};
use crate::model::Build;
use crate::predicate::BuildPredicate;
use crate::store::{ChunkStore, decode_chunk, encode_chunk};
use crate::ttl::TtlPolicy;
use crate::upstream::UpstreamSource;

/// Cache chunk size, in hours.
const CHUNK_HOURS: i64 = 1;

/// Ceiling on concurrent in-flight interval fetches, to be nice to the
/// upstream rate limit.
const CONCURRENCY: usize = 30;

/// The crate's boundary to reporting code.
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// All passed builds created in `[from, now)` that match `predicate`,
    /// in ascending interval order.
    async fn list_builds(
        &self,
        from: DateTime<Utc>,
        predicate: &dyn BuildPredicate,
    ) -> Result<Vec<Build>>;
}

/// [`BuildSource`] backed by a chunk store with upstream fallback.
///
/// Top-level calls are serialized by an instance-owned single-flight lock:
/// two overlapping queries would otherwise both miss cache and double the
/// upstream load. Within one call, interval fetches run concurrently up to
/// [`CONCURRENCY`].
pub struct CachedFetcher<U, S> {
    upstream: Arc<U>,
    store: Arc<S>,
    ttl: Arc<TtlPolicy>,
    flight: Mutex<()>,
    limit: Arc<Semaphore>,
}

impl<U, S> CachedFetcher<U, S>
where
    U: UpstreamSource + 'static,
    S: ChunkStore + 'static,
{
    pub fn new(upstream: Arc<U>, store: Arc<S>) -> Self {
        Self::with_ttl_policy(upstream, store, TtlPolicy::new())
    }

    pub fn with_ttl_policy(upstream: Arc<U>, store: Arc<S>, ttl: TtlPolicy) -> Self {
        Self {
            upstream,
            store,
            ttl: Arc::new(ttl),
            flight: Mutex::new(()),
            limit: Arc::new(Semaphore::new(CONCURRENCY)),
        }
    }

    /// Resolve one interval: chunk store first, upstream on a miss.
    ///
    /// Store read failures degrade to an upstream fetch for this interval
    /// only; a chunk that decodes badly is fatal. Store write failures are
    /// logged and swallowed — the fetch already succeeded.
    async fn resolve_interval(
        upstream: Arc<U>,
        store: Arc<S>,
        ttl: Arc<TtlPolicy>,
        interval: Interval,
        now: DateTime<Utc>,
    ) -> Result<Vec<Build>> {
        let key = interval.cache_key();

        match store.get(&key).await {
            Ok(Some(bytes)) => return decode_chunk(&bytes),
            Ok(None) => {}
            Err(e) => {
                warn!(key, error = %e, "cache read failed, falling back to upstream");
            }
        }

        let builds = upstream.fetch_interval(&interval).await?;

        let ttl = ttl.ttl_for(&interval, now);
        match encode_chunk(&builds) {
            Ok(bytes) => {
                if let Err(e) = store.put(&key, bytes, ttl).await {
                    warn!(key, error = %e, "cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "chunk encode failed, skipping cache write"),
        }

        Ok(builds)
    }
}

#[async_trait]
impl<U, S> BuildSource for CachedFetcher<U, S>
where
    U: UpstreamSource + 'static,
    S: ChunkStore + 'static,
{
    async fn list_builds(
        &self,
        from: DateTime<Utc>,
        predicate: &dyn BuildPredicate,
    ) -> Result<Vec<Build>> {
        // Hold the single-flight lock for the whole call.
        let _flight = self.flight.lock().await;

        let to = Utc::now();
        let intervals = generate_intervals(from, to, Duration::hours(CHUNK_HOURS));
        info!(intervals = intervals.len(), %from, "listing builds");

        let total = intervals.len();
        let mut handles = Vec::with_capacity(total);
        for (index, interval) in intervals.into_iter().enumerate() {
            let upstream = Arc::clone(&self.upstream);
            let store = Arc::clone(&self.store);
            let ttl = Arc::clone(&self.ttl);
            let limit = Arc::clone(&self.limit);

            handles.push(tokio::spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Other(e.to_string()))?;

                let res = Self::resolve_interval(upstream, store, ttl, interval, to).await;
                debug!(index, total, %interval, ok = res.is_ok(), "interval resolved");
                res
            }));
        }

        // Results land in slots addressed by interval position, so output
        // order never depends on completion order. All workers are awaited
        // before any error is returned.
        let mut slots: Vec<Vec<Build>> = (0..total).map(|_| Vec::new()).collect();
        let mut errors = Vec::new();
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(builds)) => slots[index] = builds,
                Ok(Err(e)) => errors.push(e),
                Err(e) => errors.push(Error::Other(format!("interval worker panicked: {e}"))),
            }
        }
        if !errors.is_empty() {
            return Err(if errors.len() == 1 {
                errors.remove(0)
            } else {
                Error::Fanout(errors)
            });
        }

        // Intervals are a superset of [from, to), so trim to the exact
        // requested range before applying the caller's predicate.
        let mut res = Vec::new();
        for builds in slots {
            for build in builds {
                if build.created_at >= from && build.created_at < to && predicate.matches(&build) {
                    res.push(build);
                }
            }
        }
        Ok(res)
    }
}
