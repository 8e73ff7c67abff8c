// Copyright (c) Microsoft Corporation.

//! Builder for the in-memory backend.

use std::marker::PhantomData;

use crate::MemoryBackend;

/// Builder for configuring a [`MemoryBackend`].
///
/// # Examples
///
/// ```
/// use rewarm_memory::MemoryBackend;
///
/// let backend = MemoryBackend::<String>::builder()
///     .max_capacity(10_000)
///     .initial_capacity(1_000)
///     .name("profiles")
///     .build();
/// ```
#[must_use]
#[derive(Debug)]
pub struct MemoryBackendBuilder<T> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MemoryBackendBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            name: None,
            _marker: PhantomData,
        }
    }

    /// Bounds the backend to at most `capacity` entries.
    ///
    /// Unbounded by default.
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Pre-allocates internal storage for roughly `capacity` entries.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Names the backend, for diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T> MemoryBackendBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Builds the backend.
    #[must_use]
    pub fn build(self) -> MemoryBackend<T> {
        MemoryBackend::from_builder(&self)
    }
}
