// Copyright (c) Microsoft Corporation.

//! Background refresh of warm entries.
//!
//! A refresh is a detached unit of work that outlives the call that spawned
//! it. It is bounded by the cache lifetime and the configured fetch timeout,
//! never by the spawning caller's context. Whether it succeeds, fails, or
//! times out, it writes the key's slot exactly once and then clears the
//! pending flag, so a failed refresh can never wedge a key.

use std::sync::Arc;

use tokio::sync::Mutex as KeyMutex;

use rewarm_backend::{Backend, Entry, Error};

use crate::cache::{FetchResult, Shared};

/// Spawns the detached refresh task for `key`.
///
/// `lock` is the same key mutex the spawning caller holds; the task waits its
/// turn on it once the caller has returned. The task is tracked by the
/// shutdown barrier, so `close` waits for it.
pub(crate) fn spawn<T, B, F, Fut>(shared: Arc<Shared<T, B>>, key: String, lock: Arc<KeyMutex<()>>, fetch: F)
where
    T: Send + Sync + 'static,
    B: Backend<T> + 'static,
    F: FnOnce(tokio_util::sync::CancellationToken, String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<FetchResult<T>, Error>> + Send + 'static,
{
    tracing::trace!(key = %key, "spawning background refresh");
    let tracker = shared.tracker.clone();
    tracker.spawn(run(shared, key, lock, fetch));
}

async fn run<T, B, F, Fut>(shared: Arc<Shared<T, B>>, key: String, lock: Arc<KeyMutex<()>>, fetch: F)
where
    T: Send + Sync + 'static,
    B: Backend<T> + 'static,
    F: FnOnce(tokio_util::sync::CancellationToken, String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<FetchResult<T>, Error>> + Send + 'static,
{
    let guard = lock.lock_owned().await;

    // The background context dies with the cache, not with the caller, and
    // the fetch is additionally bounded by a hard timeout. A timeout is an
    // ordinary fetch failure and takes the error-TTL path below.
    let bg = shared.lifetime.child_token();
    let timeout = shared.config.background_fetch_timeout;
    let fetched = match tokio::time::timeout(timeout, fetch(bg.clone(), key.clone())).await {
        Ok(fetched) => fetched,
        Err(_) => Err(Error::FetchTimeout(timeout)),
    };

    let entry = match fetched {
        Ok(result) => result.into_entry(),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "background refresh fetch failed");
            (shared.config.background_error_handler)(&err);

            let ttl = (shared.config.error_ttl)(&err);
            if ttl.is_zero() {
                // Degrade the key to a miss instead of serving the dead value
                // warm forever.
                Entry::empty_expired()
            } else {
                Entry::err(err, ttl)
            }
        }
    };

    if let Err(err) = shared.backend.set(&key, shared.config.secondary_ttl, entry).await {
        let err = Error::backend_write(&key, err);
        tracing::warn!(key = %key, error = %err, "background refresh write-back failed");
        (shared.config.background_error_handler)(&err);
    }

    drop(guard);
    shared.flights.finish_refresh(&key);
}
