// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The moka-backed in-memory backend.

use std::time::Duration;

use moka::future::Cache;

use rewarm_backend::{Backend, Entry, Error};

use crate::builder::MemoryBackendBuilder;

/// An in-memory cache backend backed by moka.
///
/// Provides concurrent access with automatic eviction once the configured
/// capacity is reached. The TTL hint passed to [`Backend::set`] is ignored;
/// entries live until evicted or overwritten, and the cache's freshness
/// classification decides what is still serviceable.
///
/// Clones share the same underlying storage.
///
/// # Examples
///
/// ```
/// use rewarm_backend::{Backend, Entry};
/// use rewarm_memory::MemoryBackend;
/// use std::time::Duration;
///
/// # futures::executor::block_on(async {
/// let backend = MemoryBackend::<i32>::new();
///
/// backend.set("key", Duration::from_secs(60), Entry::ok(42)).await?;
/// let entry = backend.get("key").await?.unwrap();
/// assert_eq!(entry.data().map(|v| **v), Some(42));
/// # Ok::<(), rewarm_backend::Error>(())
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct MemoryBackend<T>
where
    T: Send + Sync + 'static,
{
    inner: Cache<String, Entry<T>>,
}

impl<T> Default for MemoryBackend<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryBackend<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a new unbounded in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory backend bounded to `max_capacity` entries.
    ///
    /// Once the capacity is reached, entries are evicted by moka's policy
    /// (a combination of LRU eviction and LFU admission).
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory backend.
    #[must_use]
    pub fn builder() -> MemoryBackendBuilder<T> {
        MemoryBackendBuilder::new()
    }

    pub(crate) fn from_builder(builder: &MemoryBackendBuilder<T>) -> Self {
        let mut moka_builder = Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Returns the number of entries currently held.
    ///
    /// The count is approximate while evictions are in progress.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl<T> Backend<T> for MemoryBackend<T>
where
    T: Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<Entry<T>>, Error> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, _ttl: Duration, entry: Entry<T>) -> Result<(), Error> {
        self.inner.insert(key.to_owned(), entry).await;
        Ok(())
    }
}
