// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache façade: the `get` state machine over a pluggable backend.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use rewarm_backend::{Backend, Entry, Error};

use crate::builder::{CacheBuilder, Config};
use crate::refresh;
use crate::singleflight::SingleFlight;

/// How a [`Cache::get`] was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing serviceable was cached; the value was fetched synchronously.
    Miss,
    /// A stale-but-serviceable value was returned and a background refresh
    /// was scheduled (or already pending).
    WarmHit,
    /// A fresh value was returned.
    HotHit,
}

/// The result of a successful [`Cache::get`].
#[derive(Debug)]
pub struct Lookup<T> {
    /// The cached or freshly fetched value. `None` only for the rare case of
    /// reading an empty sentinel entry in the instant before it expires.
    pub data: Option<Arc<T>>,
    /// How the lookup was satisfied.
    pub outcome: Outcome,
}

impl<T> Clone for Lookup<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            outcome: self.outcome,
        }
    }
}

/// A value produced by a fetch callable.
///
/// # Examples
///
/// ```
/// use rewarm::FetchResult;
/// use chrono::{TimeDelta, Utc};
///
/// // A plain result, stamped with the completion time by the cache.
/// let fresh = FetchResult::new("value".to_string());
///
/// // A result that is already two minutes old, e.g. from an upstream cache.
/// let aged = FetchResult::new("value".to_string())
///     .with_created_at(Utc::now() - TimeDelta::minutes(2));
/// ```
#[derive(Debug)]
pub struct FetchResult<T> {
    data: T,
    created_at: Option<DateTime<Utc>>,
}

impl<T> FetchResult<T> {
    /// Wraps a freshly produced value.
    pub fn new(data: T) -> Self {
        Self {
            data,
            created_at: None,
        }
    }

    /// Declares when the value was actually produced.
    ///
    /// When absent, the cache stamps the entry with the fetch completion time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub(crate) fn into_entry(self) -> Entry<T> {
        match self.created_at {
            Some(created) => Entry::ok_at(self.data, created),
            None => Entry::ok(self.data),
        }
    }
}

pub(crate) struct Shared<T, B> {
    pub(crate) backend: B,
    pub(crate) config: Config,
    pub(crate) flights: SingleFlight,
    /// Cancelled on close; parent of every background refresh context.
    pub(crate) lifetime: CancellationToken,
    /// Barrier over in-flight `get` calls and background refreshes.
    pub(crate) tracker: TaskTracker,
    pub(crate) _marker: PhantomData<fn() -> T>,
}

/// A concurrent two-tier TTL cache for expensive-to-produce values.
///
/// `Cache` coordinates access to a [`Backend`]: it classifies cached entries
/// as hot, warm, or expired, collapses concurrent producers for the same key
/// into a single fetch, and recomputes warm entries in the background so
/// callers keep getting answers without waiting.
///
/// Refreshes are spawned on the ambient tokio runtime, so `get` must be
/// called from within one. Cloning the cache produces another handle to the
/// same instance.
///
/// # Examples
///
/// ```
/// use rewarm::{Cache, CancellationToken, FetchResult};
/// use rewarm_memory::MemoryBackend;
///
/// # futures::executor::block_on(async {
/// let cache = Cache::builder(MemoryBackend::new()).build()?;
/// let ctx = CancellationToken::new();
///
/// let hit = cache
///     .get(&ctx, "user:1", |_ctx, _key| async move {
///         Ok(FetchResult::new("ada".to_string()))
///     })
///     .await?;
///
/// assert_eq!(hit.data.as_deref().map(String::as_str), Some("ada"));
/// # Ok::<(), rewarm::Error>(())
/// # });
/// ```
pub struct Cache<T, B> {
    shared: Arc<Shared<T, B>>,
}

impl<T, B> std::fmt::Debug for Cache<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<T, B> Clone for Cache<T, B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, B> Cache<T, B>
where
    T: Send + Sync + 'static,
    B: Backend<T> + 'static,
{
    /// Creates a new cache builder over the given backend.
    ///
    /// The backend is shared by reference semantics inside the cache but
    /// remains owned by the caller's choice of type; closing the cache never
    /// closes the backend.
    pub fn builder(backend: B) -> CacheBuilder<T, B> {
        CacheBuilder::new(backend)
    }

    pub(crate) fn from_parts(backend: B, config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                config,
                flights: SingleFlight::default(),
                lifetime: CancellationToken::new(),
                tracker: TaskTracker::new(),
                _marker: PhantomData,
            }),
        }
    }

    /// Retrieves the value for `key`, fetching it with `fetch` if needed.
    ///
    /// One pass over the per-key state machine:
    ///
    /// - nothing cached, or cached past the secondary TTL: `fetch` runs now,
    ///   under the key's single-flight lock, and the result is written back
    ///   ([`Outcome::Miss`]);
    /// - cached within the primary TTL: returned as is ([`Outcome::HotHit`]);
    /// - cached between the TTLs: returned immediately while a detached
    ///   refresh recomputes the value ([`Outcome::WarmHit`]). At most one
    ///   refresh is in flight per key.
    ///
    /// The fetch callable receives a cancellation token derived from `ctx`
    /// and, for the foreground case, from the cache lifetime; it is expected
    /// to honour it. A background refresh is never tied to `ctx`: cancelling
    /// the caller after a warm hit does not disturb the refresh it started.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Closed`] once [`close`](Self::close) was called,
    /// with [`Error::Cancelled`] if `ctx` was already cancelled, with a
    /// wrapped backend error if the read or the foreground write-back fails,
    /// and with the fetch error if a synchronous fetch fails. A negatively
    /// cached failure is returned as the error of the call that cached it and
    /// of every read that hits it afterwards.
    pub async fn get<F, Fut>(&self, ctx: &CancellationToken, key: &str, fetch: F) -> Result<Lookup<T>, Error>
    where
        F: FnOnce(CancellationToken, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<FetchResult<T>, Error>> + Send + 'static,
    {
        if self.shared.lifetime.is_cancelled() {
            return Err(Error::Closed);
        }
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        // From here on we count towards the shutdown barrier; the token is
        // released when this call returns or is dropped.
        let _in_flight = self.shared.tracker.token();

        let slot = self.shared.flights.join(key).await;

        let entry = self
            .shared
            .backend
            .get(key)
            .await
            .map_err(|err| Error::backend_read(key, err))?;

        match entry {
            // Cached data is stale or missing; fetch immediately, still
            // holding the key.
            None => self.fetch_and_store(ctx, key, fetch).await,
            Some(entry) if entry.is_expired(self.shared.config.secondary_ttl) => {
                self.fetch_and_store(ctx, key, fetch).await
            }

            // Cached data is fresh.
            Some(entry) if !entry.is_expired(self.shared.config.primary_ttl) => {
                Self::resolve(entry, Outcome::HotHit)
            }

            // Cached data can be returned, but needs a refresh in the
            // background. The claim and the spawn happen before the slot is
            // released, so a second warm caller observes the pending flag.
            Some(entry) => {
                if let Some(lock) = self.shared.flights.try_claim_refresh(key) {
                    refresh::spawn(Arc::clone(&self.shared), key.to_owned(), lock, fetch);
                }
                drop(slot);
                Self::resolve(entry, Outcome::WarmHit)
            }
        }
    }

    /// The miss branch: run the fetch in the foreground and write back.
    ///
    /// Runs with the caller's `KeyGuard` held (it lives in the caller's
    /// frame), which is what serialises concurrent producers.
    async fn fetch_and_store<F, Fut>(&self, ctx: &CancellationToken, key: &str, fetch: F) -> Result<Lookup<T>, Error>
    where
        F: FnOnce(CancellationToken, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<FetchResult<T>, Error>> + Send + 'static,
    {
        // The foreground context is a child of the caller's and additionally
        // dies with the cache.
        let fg = ctx.child_token();
        let fetched = tokio::select! {
            // Shutdown wins over starting (or finishing) the fetch.
            biased;
            () = self.shared.lifetime.cancelled() => {
                fg.cancel();
                return Err(Error::Closed);
            }
            fetched = fetch(fg.clone(), key.to_owned()) => fetched,
        };

        let entry = match fetched {
            Ok(result) => result.into_entry(),
            Err(err) => {
                let ttl = (self.shared.config.error_ttl)(&err);
                if ttl.is_zero() {
                    // Not negatively cached; nothing is written.
                    return Err(err);
                }
                Entry::err(err, ttl)
            }
        };

        self.shared
            .backend
            .set(key, self.shared.config.secondary_ttl, entry.clone())
            .await
            .map_err(|err| Error::backend_write(key, err))?;

        Self::resolve(entry, Outcome::Miss)
    }

    /// Collapses an entry into the caller-facing result.
    ///
    /// The core never produces an entry carrying both data and an error, so a
    /// cached failure simply becomes the call's error.
    fn resolve(entry: Entry<T>, outcome: Outcome) -> Result<Lookup<T>, Error> {
        match entry.error() {
            Some(err) => Err(err.clone()),
            None => Ok(Lookup {
                data: entry.data().cloned(),
                outcome,
            }),
        }
    }

    /// Closes the cache and waits for in-flight work to drain.
    ///
    /// Cancels the lifetime context, aborting foreground fetch waits and
    /// signalling background refresh contexts, then waits until every `get`
    /// call and every spawned refresh has finished. After `close` returns, a
    /// subsequent `get` fails immediately with [`Error::Closed`].
    ///
    /// Idempotent; concurrent closes all wait for the same drain.
    pub async fn close(&self) {
        self.shared.lifetime.cancel();
        self.shared.tracker.close();
        tracing::debug!("cache closing, draining in-flight operations");
        self.shared.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewarm_backend::testing::MockBackend;
    use std::time::Duration;

    #[tokio::test]
    async fn slots_are_removed_after_a_miss_completes() {
        let cache = Cache::builder(MockBackend::<String>::new()).build().unwrap();
        let ctx = CancellationToken::new();

        cache
            .get(&ctx, "k", |_ctx, _key| async move { Ok(FetchResult::new("v".to_string())) })
            .await
            .unwrap();

        assert_eq!(cache.shared.flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn slots_are_removed_after_a_refresh_drains() {
        let cache = Cache::builder(MockBackend::<String>::new())
            .ttl(Duration::from_millis(50), Duration::from_secs(10))
            .build()
            .unwrap();
        let ctx = CancellationToken::new();

        cache
            .get(&ctx, "k", |_ctx, _key| async move { Ok(FetchResult::new("v1".to_string())) })
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        let hit = cache
            .get(&ctx, "k", |_ctx, _key| async move { Ok(FetchResult::new("v2".to_string())) })
            .await
            .unwrap();
        assert_eq!(hit.outcome, Outcome::WarmHit);

        // Let the spawned refresh write back and release its waiter.
        cache.close().await;
        assert_eq!(cache.shared.flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn empty_sentinel_read_in_its_own_instant_yields_no_data() {
        // A sentinel whose fixed expiration has not yet passed classifies as
        // hot; the lookup then carries neither data nor error.
        let entry = Entry::<String>::from_parts(None, None, Utc::now(), Some(Utc::now() + chrono::TimeDelta::minutes(1)));
        let lookup = Cache::<String, MockBackend<String>>::resolve(entry, Outcome::HotHit).unwrap();
        assert!(lookup.data.is_none());
        assert_eq!(lookup.outcome, Outcome::HotHit);
    }
}
