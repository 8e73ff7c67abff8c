// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend implementation for testing.
//!
//! This module provides [`MockBackend`], an in-memory backend that records
//! all operations and supports failure injection for testing error paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{Backend, Entry, Error};

/// Recorded backend operation with full context.
#[derive(Debug)]
pub enum BackendOp<T> {
    /// A get was performed with the given key.
    Get(String),
    /// A set was performed with the given key, TTL hint, and entry.
    Set {
        /// The key that was written.
        key: String,
        /// The retention hint the cache passed along.
        ttl: Duration,
        /// The entry that was written.
        entry: Entry<T>,
    },
}

impl<T> Clone for BackendOp<T> {
    fn clone(&self) -> Self {
        match self {
            BackendOp::Get(key) => BackendOp::Get(key.clone()),
            BackendOp::Set { key, ttl, entry } => BackendOp::Set {
                key: key.clone(),
                ttl: *ttl,
                entry: entry.clone(),
            },
        }
    }
}

impl<T> BackendOp<T> {
    /// Returns the key this operation targeted.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            BackendOp::Get(key) => key,
            BackendOp::Set { key, .. } => key,
        }
    }

    /// Returns `true` if this is a get operation.
    #[must_use]
    pub fn is_get(&self) -> bool {
        matches!(self, BackendOp::Get(_))
    }

    /// Returns `true` if this is a set operation.
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, BackendOp::Set { .. })
    }
}

type FailPredicate<T> = Box<dyn Fn(&BackendOp<T>) -> bool + Send + Sync>;

/// A configurable mock backend for testing.
///
/// Stores entries in memory, records every operation for later verification,
/// and can be configured to fail operations on demand. Clones share the same
/// underlying state, so a handle kept outside the cache can observe writes
/// the cache performs.
///
/// # Examples
///
/// ```
/// use rewarm_backend::{Backend, Entry, testing::MockBackend};
/// use std::time::Duration;
///
/// # futures::executor::block_on(async {
/// let backend = MockBackend::<i32>::new();
///
/// backend.set("key", Duration::from_secs(60), Entry::ok(42)).await?;
/// let entry = backend.get("key").await?.unwrap();
/// assert_eq!(entry.data().map(|v| **v), Some(42));
///
/// assert_eq!(backend.operations().len(), 2);
/// # Ok::<(), rewarm_backend::Error>(())
/// # });
/// ```
pub struct MockBackend<T> {
    data: Arc<Mutex<HashMap<String, Entry<T>>>>,
    operations: Arc<Mutex<Vec<BackendOp<T>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<T>>>>,
}

impl<T> std::fmt::Debug for MockBackend<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("data", &self.data)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<T> Clone for MockBackend<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<T> Default for MockBackend<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MockBackend<T> {
    /// Creates a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the entry currently stored under `key` without recording a get.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Entry<T>> {
        self.data.lock().get(key).cloned()
    }

    /// Returns the number of entries currently stored.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should
    /// fail. A failing operation is still recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use rewarm_backend::testing::{BackendOp, MockBackend};
    ///
    /// let backend: MockBackend<i32> = MockBackend::new();
    ///
    /// // Fail all writes.
    /// backend.fail_when(|op| op.is_set());
    ///
    /// // Fail reads of a specific key.
    /// backend.fail_when(|op| matches!(op, BackendOp::Get(k) if k == "bad_key"));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BackendOp<T>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BackendOp<T>> {
        self.operations.lock().clone()
    }

    /// Returns the number of recorded set operations.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.operations.lock().iter().filter(|op| op.is_set()).count()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: BackendOp<T>) -> bool {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        fail
    }
}

impl<T> Backend<T> for MockBackend<T>
where
    T: Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<Entry<T>>, Error> {
        if self.record(BackendOp::Get(key.to_owned())) {
            return Err(Error::message("mock: get failed"));
        }
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, ttl: Duration, entry: Entry<T>) -> Result<(), Error> {
        if self.record(BackendOp::Set {
            key: key.to_owned(),
            ttl,
            entry: entry.clone(),
        }) {
            return Err(Error::message("mock: set failed"));
        }
        self.data.lock().insert(key.to_owned(), entry);
        Ok(())
    }
}
