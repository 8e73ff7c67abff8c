// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`Backend`] defines the interface the cache façade drives. Implement the
//! storage operations and the façade layers freshness classification,
//! single-flight coordination, and background refresh on top.

use std::time::Duration;

use crate::{Entry, Error};

/// Trait for cache storage backends.
///
/// A backend is keyed storage for [`Entry`] values. It owns its eviction
/// policy entirely; the `ttl` passed to [`set`](Self::set) is only a retention
/// hint, and a backend may evict earlier than the hint but should not retain
/// entries past it when it is able to honour it. An in-memory backend
/// typically ignores the hint; a backend over an external store uses it as the
/// store's own expiry.
///
/// Implementations must be safe to call from any number of threads
/// concurrently; the cache never serialises backend calls across keys.
///
/// Returning `Ok(None)` from [`get`](Self::get) means the key is absent, which
/// is not an error. The cache treats an absent entry and an entry expired past
/// the secondary TTL identically.
pub trait Backend<T>: Send + Sync {
    /// Gets the entry stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Entry<T>>, Error>> + Send;

    /// Stores `entry` under `key` with a retention hint of `ttl`.
    ///
    /// Overwrites any previous entry for the key.
    fn set(&self, key: &str, ttl: Duration, entry: Entry<T>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Releases resources held by the backend. Must be idempotent.
    ///
    /// The cache never calls this: the backend is owned by whoever created it,
    /// and closing the cache does not close the backend.
    fn close(&self) {}
}
