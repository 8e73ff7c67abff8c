// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A concurrent two-tier TTL cache that serves slightly stale values while a
//! fresh one is recomputed in the background.
//!
//! This crate trades a little staleness for a lot of tail latency:
//! - An entry younger than the **primary TTL** is served directly.
//! - Between the primary and the **secondary TTL** the entry is still served,
//!   but a detached refresh recomputes it so the next caller gets a fresh one.
//! - Past the secondary TTL the caller fetches synchronously.
//!
//! Concurrent requests for the same missing or expired key collapse onto a
//! single producer call, and at most one background refresh is in flight per
//! key. Storage is pluggable through the [`Backend`] trait; `rewarm_memory`
//! provides an in-memory backend and `rewarm_redis` a Redis-based one.
//!
//! # Examples
//!
//! ```
//! use rewarm::{Cache, CancellationToken, FetchResult, Outcome};
//! use rewarm_memory::MemoryBackend;
//! use std::time::Duration;
//!
//! # futures::executor::block_on(async {
//! let cache = Cache::builder(MemoryBackend::new())
//!     .ttl(Duration::from_secs(60), Duration::from_secs(3600))
//!     .build()?;
//! let ctx = CancellationToken::new();
//!
//! let first = cache
//!     .get(&ctx, "greeting", |_ctx, _key| async move {
//!         Ok(FetchResult::new("hello".to_string()))
//!     })
//!     .await?;
//! assert_eq!(first.outcome, Outcome::Miss);
//!
//! let second = cache
//!     .get(&ctx, "greeting", |_ctx, _key| async move {
//!         unreachable!("fresh entries are served from the backend")
//!     })
//!     .await?;
//! assert_eq!(second.outcome, Outcome::HotHit);
//! assert_eq!(second.data.as_deref().map(String::as_str), Some("hello"));
//! # Ok::<(), rewarm::Error>(())
//! # });
//! ```
//!
//! Negative caching is opt-in through
//! [`CacheBuilder::error_ttl`](crate::CacheBuilder::error_ttl), and failures
//! inside background refreshes are reported exclusively through
//! [`CacheBuilder::background_error_handler`](crate::CacheBuilder::background_error_handler).

mod builder;
mod cache;
mod refresh;
mod singleflight;

#[doc(inline)]
pub use builder::CacheBuilder;
#[doc(inline)]
pub use cache::{Cache, FetchResult, Lookup, Outcome};
#[doc(inline)]
pub use rewarm_backend::{Backend, BoxError, Entry, Error, Result};

// Callers need a token for every `get`; re-exported so simple uses don't have
// to depend on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
