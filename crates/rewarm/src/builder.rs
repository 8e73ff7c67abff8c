// Copyright (c) Microsoft Corporation.

//! Cache builder and configuration.
//!
//! This module provides the builder used to construct a [`Cache`] with
//! validated TTL and background-fetch settings.

use std::marker::PhantomData;
use std::time::Duration;

use rewarm_backend::{Backend, Error};

use crate::Cache;

pub(crate) type ErrorTtlFn = Box<dyn Fn(&Error) -> Duration + Send + Sync>;
pub(crate) type BackgroundErrorHandler = Box<dyn Fn(&Error) + Send + Sync>;

/// Validated cache configuration, immutable after construction.
pub(crate) struct Config {
    pub(crate) primary_ttl: Duration,
    pub(crate) secondary_ttl: Duration,
    pub(crate) background_fetch_timeout: Duration,
    pub(crate) error_ttl: ErrorTtlFn,
    pub(crate) background_error_handler: BackgroundErrorHandler,
}

/// Builder for constructing a [`Cache`].
///
/// Created by calling [`Cache::builder`]. Allows configuring the freshness
/// windows, the background fetch bound, negative caching, and the sink for
/// background failures before constructing the cache.
///
/// # Examples
///
/// ```
/// use rewarm::Cache;
/// use rewarm_memory::MemoryBackend;
/// use std::time::Duration;
///
/// let cache = Cache::<String, _>::builder(MemoryBackend::new())
///     .ttl(Duration::from_secs(60), Duration::from_secs(3600))
///     .background_fetch_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok::<(), rewarm::Error>(())
/// ```
#[must_use]
pub struct CacheBuilder<T, B> {
    backend: B,
    primary_ttl: Duration,
    secondary_ttl: Duration,
    background_fetch_timeout: Duration,
    error_ttl: ErrorTtlFn,
    background_error_handler: BackgroundErrorHandler,
    _marker: PhantomData<fn() -> T>,
}

impl<T, B> CacheBuilder<T, B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            primary_ttl: Duration::from_secs(60),
            secondary_ttl: Duration::from_secs(3600),
            background_fetch_timeout: Duration::from_secs(60),
            // Defaults: don't cache errors, swallow background failures.
            error_ttl: Box::new(|_| Duration::ZERO),
            background_error_handler: Box::new(|_| {}),
            _marker: PhantomData,
        }
    }

    /// Sets the primary and secondary TTLs.
    ///
    /// An entry younger than `primary` is served as is. Between `primary` and
    /// `secondary` it is still served, but a background refresh is scheduled.
    /// Past `secondary` it is unserviceable and the caller fetches
    /// synchronously.
    ///
    /// Both must be positive and `secondary` must exceed `primary`;
    /// [`build`](Self::build) rejects anything else.
    pub fn ttl(mut self, primary: Duration, secondary: Duration) -> Self {
        self.primary_ttl = primary;
        self.secondary_ttl = secondary;
        self
    }

    /// Bounds every background refresh fetch to `timeout`.
    ///
    /// A fetch that exceeds the bound is treated as an ordinary fetch
    /// failure. Must be positive.
    pub fn background_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.background_fetch_timeout = timeout;
        self
    }

    /// Decides if and for how long fetch failures are negatively cached.
    ///
    /// Returning [`Duration::ZERO`] disables negative caching for that error.
    /// The default caches nothing.
    pub fn error_ttl<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) -> Duration + Send + Sync + 'static,
    {
        self.error_ttl = Box::new(f);
        self
    }

    /// Installs a sink for failures that happen during background refreshes.
    ///
    /// Background failures never surface at a caller; this handler is the
    /// only place they are reported. The default discards them.
    pub fn background_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.background_error_handler = Box::new(handler);
        self
    }
}

impl<T, B> CacheBuilder<T, B>
where
    T: Send + Sync + 'static,
    B: Backend<T> + 'static,
{
    /// Validates the configuration and builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either TTL is zero, the secondary TTL
    /// does not exceed the primary, or the background fetch timeout is zero.
    pub fn build(self) -> Result<Cache<T, B>, Error> {
        if self.primary_ttl.is_zero() {
            return Err(Error::Config("primary TTL must be positive".into()));
        }
        if self.secondary_ttl <= self.primary_ttl {
            return Err(Error::Config(
                "secondary TTL must be greater than the primary TTL".into(),
            ));
        }
        if self.background_fetch_timeout.is_zero() {
            return Err(Error::Config("background fetch timeout must be positive".into()));
        }

        Ok(Cache::from_parts(
            self.backend,
            Config {
                primary_ttl: self.primary_ttl,
                secondary_ttl: self.secondary_ttl,
                background_fetch_timeout: self.background_fetch_timeout,
                error_ttl: self.error_ttl,
                background_error_handler: self.background_error_handler,
            },
        ))
    }
}
