// Copyright (c) Microsoft Corporation.

//! In-memory backend for the rewarm cache, built on moka.
//!
//! This crate provides [`MemoryBackend`], a process-local backend with
//! concurrent access and capacity-based eviction. The retention hint passed
//! by the cache is deliberately ignored: eviction policy belongs to the
//! backend, and the cache's own freshness windows already bound how long an
//! entry is served.

mod backend;
mod builder;

#[doc(inline)]
pub use backend::MemoryBackend;
#[doc(inline)]
pub use builder::MemoryBackendBuilder;
