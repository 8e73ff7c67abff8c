// Copyright (c) Microsoft Corporation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::Error;

/// A cached value with freshness metadata.
///
/// An entry holds either a value, a negatively cached failure, or neither
/// (the "empty expired" sentinel used to degrade a key back to a miss). It
/// never holds both a value and a failure.
///
/// Entries are immutable once constructed; a refresh installs a brand new
/// entry in the backend slot. Cloning is cheap: the value is reference
/// counted.
///
/// # Examples
///
/// ```
/// use rewarm_backend::Entry;
/// use std::time::Duration;
///
/// let entry = Entry::ok("payload".to_string());
/// assert!(!entry.is_expired(Duration::from_secs(60)));
/// assert!(entry.is_expired(Duration::ZERO));
/// ```
#[derive(Debug)]
pub struct Entry<T> {
    data: Option<Arc<T>>,
    err: Option<Error>,
    created: DateTime<Utc>,
    fixed_expiration: Option<DateTime<Utc>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            err: self.err.clone(),
            created: self.created,
            fixed_expiration: self.fixed_expiration,
        }
    }
}

impl<T> Entry<T> {
    /// Creates an entry holding a freshly produced value.
    ///
    /// The creation time is the current wall-clock time.
    pub fn ok(data: T) -> Self {
        Self::ok_at(data, Utc::now())
    }

    /// Creates a value entry with an explicit production time.
    ///
    /// Used when the producer knows the value is already some age old, for
    /// example because it came out of an upstream cache.
    pub fn ok_at(data: T, created: DateTime<Utc>) -> Self {
        Self {
            data: Some(Arc::new(data)),
            err: None,
            created,
            fixed_expiration: None,
        }
    }

    /// Creates a negatively cached failure that expires `ttl` from now.
    ///
    /// The fixed expiration takes precedence over any TTL passed to
    /// [`is_expired`](Self::is_expired).
    pub fn err(err: Error, ttl: Duration) -> Self {
        let expiration = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            data: None,
            err: Some(err),
            created: DateTime::<Utc>::UNIX_EPOCH,
            fixed_expiration: Some(expiration),
        }
    }

    /// Creates the sentinel entry that is expired from the moment it exists.
    ///
    /// Writing this sentinel lets callers treat "never fetched" and "no longer
    /// serviceable" uniformly: the next read sees an expired entry and fetches
    /// synchronously.
    pub fn empty_expired() -> Self {
        Self {
            data: None,
            err: None,
            created: DateTime::<Utc>::UNIX_EPOCH,
            fixed_expiration: Some(Utc::now()),
        }
    }

    /// Reassembles an entry from its stored parts.
    ///
    /// This is for backends recreating entries from persistent storage; it
    /// performs no validation beyond the type system's.
    pub fn from_parts(
        data: Option<Arc<T>>,
        err: Option<Error>,
        created: DateTime<Utc>,
        fixed_expiration: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            data,
            err,
            created,
            fixed_expiration,
        }
    }

    /// Returns the cached value, if this entry holds one.
    #[must_use]
    pub fn data(&self) -> Option<&Arc<T>> {
        self.data.as_ref()
    }

    /// Returns the negatively cached failure, if this entry holds one.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// Returns the wall-clock time at which the value was produced.
    #[must_use]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns the fixed expiration instant, if one is set.
    #[must_use]
    pub fn fixed_expiration(&self) -> Option<DateTime<Utc>> {
        self.fixed_expiration
    }

    /// Returns `true` if this entry is expired for the given TTL.
    ///
    /// A fixed expiration, when present, wins over the TTL. Otherwise the
    /// entry expires once `created + ttl` lies strictly in the past, so an
    /// entry is never expired at the exact boundary instant. A TTL large
    /// enough to overflow the time type means "never expires".
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let now = Utc::now();

        if let Some(expiration) = self.fixed_expiration {
            return expiration < now;
        }

        match TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| self.created.checked_add_signed(delta))
        {
            Some(deadline) => deadline < now,
            None => false,
        }
    }
}
