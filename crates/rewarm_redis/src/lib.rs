// Copyright (c) Microsoft Corporation.

//! Redis backend for the rewarm cache.
//!
//! Entries are stored as JSON strings under a configurable key prefix, with
//! the cache's retention hint mapped onto the Redis key expiry. Cached
//! failures survive only as their messages: a serialising store cannot
//! preserve the runtime type of an error, so equality checks against
//! retrieved failures are limited to the message text.

mod backend;
mod record;

#[doc(inline)]
pub use backend::RedisBackend;
