// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The Redis-backed backend.

use std::marker::PhantomData;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Serialize, de::DeserializeOwned};

use rewarm_backend::{Backend, Entry, Error};

use crate::record;

/// A cache backend that stores entries in Redis.
///
/// Entries are serialised to JSON; the value type has to be JSON-serialisable
/// both ways. A cached failure is stored as its message only, so its original
/// type is lost and a retrieved failure compares equal to nothing but its
/// message.
///
/// The retention hint passed by the cache becomes the Redis key expiry, so
/// Redis may drop an entry early under memory pressure but will not serve one
/// past the hint.
///
/// Clones share the same connection.
///
/// # Examples
///
/// ```no_run
/// use redis::Client;
/// use rewarm_redis::RedisBackend;
///
/// # async fn example() -> Result<(), rewarm_backend::Error> {
/// let client = Client::open("redis://127.0.0.1/").map_err(rewarm_backend::Error::other)?;
/// let backend = RedisBackend::<String>::connect(&client, "myapp:").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend<T> {
    conn: ConnectionManager,
    key_prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for RedisBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl<T> RedisBackend<T> {
    /// Connects to Redis through the given client.
    ///
    /// Every key is stored under `key_prefix` so several caches can share one
    /// Redis database.
    ///
    /// # Errors
    ///
    /// Fails if a connection cannot be established.
    pub async fn connect(client: &Client, key_prefix: impl Into<String>) -> Result<Self, Error> {
        let conn = client.get_connection_manager().await.map_err(Error::other)?;
        Ok(Self::with_connection(conn, key_prefix))
    }

    /// Wraps an existing connection manager.
    pub fn with_connection(conn: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            _marker: PhantomData,
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl<T> Backend<T> for RedisBackend<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Option<Entry<T>>, Error> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.prefixed(key)).await.map_err(Error::other)?;

        match raw {
            None => Ok(None),
            Some(raw) => record::decode(&raw).map(Some),
        }
    }

    async fn set(&self, key: &str, ttl: Duration, entry: Entry<T>) -> Result<(), Error> {
        let payload = record::encode(&entry)?;

        // Redis rejects a zero expiry; the hint is always positive in
        // practice but sub-second hints round up to the minimum.
        let seconds = ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(self.prefixed(key), payload, seconds)
            .await
            .map_err(Error::other)?;
        Ok(())
    }
}
