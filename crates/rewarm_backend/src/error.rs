// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error as ThisError;

/// A boxed error that can cross thread boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error from a cache operation.
///
/// This is an umbrella type for everything that can go wrong around the cache:
/// lifecycle failures (`Closed`, `Cancelled`), wrapped backend failures with the
/// affected key attached, and errors produced by user fetch callables.
///
/// The type is `Clone` because a cached failure lives inside an entry and may be
/// surfaced to any number of concurrent callers. Wrapped sources are reference
/// counted for the same reason.
///
/// # Examples
///
/// ```
/// use rewarm_backend::Error;
///
/// let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "row missing");
/// let error = Error::other(io_err);
/// assert!(error.to_string().contains("row missing"));
/// ```
#[derive(Clone, Debug, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// The cache has been closed; no further operations are accepted.
    #[error("cache is closed")]
    Closed,

    /// The caller's context was cancelled before or during the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The cache was constructed with an invalid option.
    #[error("invalid config: {0}")]
    Config(String),

    /// A background fetch exceeded its configured timeout.
    ///
    /// This flows through the error-TTL pipeline like any other fetch failure.
    #[error("fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    /// Reading an entry from the backend failed.
    #[error("cache backend failed for key '{key}': {source}")]
    BackendRead {
        /// The key whose read failed.
        key: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// Writing an entry to the backend failed.
    #[error("failed to update cache for key '{key}': {source}")]
    BackendWrite {
        /// The key whose write failed.
        key: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// We are re-packaging an error from a fetch callable or a backend
    /// implementation without adding further detail at the cache layer.
    #[error(transparent)]
    Other(Arc<dyn std::error::Error + Send + Sync>),

    /// An error that only carries a message.
    ///
    /// Serialising backends that cannot preserve error identity rehydrate
    /// cached failures into this variant.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Wraps an arbitrary error without adding further detail.
    ///
    /// The original error stays reachable through [`std::error::Error::source`].
    pub fn other(err: impl Into<BoxError>) -> Self {
        Error::Other(Arc::from(err.into()))
    }

    /// Creates an error that only carries a message.
    ///
    /// Prefer [`other`](Self::other) when wrapping an existing error so the
    /// source chain is preserved.
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }

    /// Wraps a backend read failure, attaching the affected key.
    pub fn backend_read(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::BackendRead {
            key: key.into(),
            source: Arc::from(source.into()),
        }
    }

    /// Wraps a backend write failure, attaching the affected key.
    pub fn backend_write(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::BackendWrite {
            key: key.into(),
            source: Arc::from(source.into()),
        }
    }

    /// Returns `true` if this error reports a closed cache.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// Returns `true` if this error reports a cancelled caller context.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::io::{self, ErrorKind};

    #[test]
    fn other_preserves_source() {
        let io_err = io::Error::new(ErrorKind::ConnectionRefused, "connection refused");
        let error = Error::other(io_err);

        let source = error.source().expect("source should be preserved");
        let extracted = source.downcast_ref::<io::Error>().expect("should be io::Error");
        assert_eq!(extracted.kind(), ErrorKind::ConnectionRefused);
    }

    #[test]
    fn other_is_transparent_for_display() {
        let error = Error::other(io::Error::new(ErrorKind::NotFound, "not found"));
        assert_eq!(error.to_string(), "not found");
    }

    #[test]
    fn backend_read_mentions_key_and_cause() {
        let error = Error::backend_read("user:1", io::Error::new(ErrorKind::Other, "socket closed"));
        let display = error.to_string();
        assert!(display.contains("user:1"), "got: {display}");
        assert!(display.contains("socket closed"), "got: {display}");
    }

    #[test]
    fn message_only_error_has_no_source() {
        let error = Error::message("just a message");
        assert!(error.source().is_none());
        assert_eq!(error.to_string(), "just a message");
    }

    #[test]
    fn error_is_clone() {
        let error = Error::backend_write("k", io::Error::new(ErrorKind::TimedOut, "timeout"));
        let cloned = error.clone();
        assert_eq!(error.to_string(), cloned.to_string());
    }

    #[test]
    fn lifecycle_predicates() {
        assert!(Error::Closed.is_closed());
        assert!(!Error::Closed.is_cancelled());
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::message("x").is_closed());
    }
}
