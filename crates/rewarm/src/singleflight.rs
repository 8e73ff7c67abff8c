// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-key single-flight coordination.
//!
//! Each live key owns a reference-counted slot holding the mutex that
//! serialises producers for that key and the flag marking a pending
//! background refresh. A slot exists exactly while someone is interested in
//! the key: the last waiter out removes it, and a later request allocates a
//! fresh one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as KeyMutex, OwnedMutexGuard};

/// Registry of per-key coordination slots.
///
/// The registry lock is only ever held for map lookups and counter updates,
/// never across I/O or an await point. The per-key mutex is taken *after*
/// releasing the registry lock.
#[derive(Default)]
pub(crate) struct SingleFlight {
    slots: Mutex<HashMap<String, Slot>>,
}

struct Slot {
    /// Callers currently inside `get` plus a pending refresh, if any.
    waiters: usize,
    /// True while a background refresh is scheduled or running for the key.
    update_pending: bool,
    lock: Arc<KeyMutex<()>>,
}

impl SingleFlight {
    /// Joins the flight for `key` and waits for exclusive access to it.
    ///
    /// Blocks behind any caller already producing a value for the key; that
    /// is the single-flight property. The returned guard releases the key and
    /// the waiter count on drop, so dropping a caller's future mid-wait keeps
    /// the accounting intact.
    pub(crate) async fn join(&self, key: &str) -> KeyGuard<'_> {
        let lock = {
            let mut slots = self.slots.lock();
            match slots.get_mut(key) {
                Some(slot) => {
                    slot.waiters += 1;
                    Arc::clone(&slot.lock)
                }
                None => {
                    let lock = Arc::new(KeyMutex::new(()));
                    slots.insert(
                        key.to_owned(),
                        Slot {
                            waiters: 1,
                            update_pending: false,
                            lock: Arc::clone(&lock),
                        },
                    );
                    lock
                }
            }
        };

        let mut guard = KeyGuard {
            flights: self,
            key: key.to_owned(),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }

    /// Claims the right to run the background refresh for `key`.
    ///
    /// Returns the key's mutex if no refresh is pending yet; the claim counts
    /// as its own waiter, which keeps the slot alive until
    /// [`finish_refresh`](Self::finish_refresh). Returns `None` if a refresh
    /// is already pending, or if no slot exists (the caller must hold a
    /// [`KeyGuard`], so the latter cannot normally happen).
    pub(crate) fn try_claim_refresh(&self, key: &str) -> Option<Arc<KeyMutex<()>>> {
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(key)?;
        if slot.update_pending {
            return None;
        }
        slot.update_pending = true;
        slot.waiters += 1;
        Some(Arc::clone(&slot.lock))
    }

    /// Ends a refresh claimed with [`try_claim_refresh`](Self::try_claim_refresh).
    ///
    /// Clears the pending flag, drops the refresh's waiter count, and removes
    /// the slot if it was the last waiter.
    pub(crate) fn finish_refresh(&self, key: &str) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(key) {
            slot.update_pending = false;
            slot.waiters -= 1;
            if slot.waiters == 0 {
                slots.remove(key);
            }
        }
    }

    /// Number of keys with a live slot.
    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Exclusive access to a key, handed out by [`SingleFlight::join`].
pub(crate) struct KeyGuard<'a> {
    flights: &'a SingleFlight,
    key: String,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release the key mutex before touching the registry; a queued caller
        // or refresh may then proceed while we update the counts.
        self.held.take();

        let mut slots = self.flights.slots.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.waiters -= 1;
            if slot.waiters == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn join_creates_slot_and_drop_removes_it() {
        let flights = SingleFlight::default();

        let guard = flights.join("k").await;
        assert_eq!(flights.slot_count(), 1);

        drop(guard);
        assert_eq!(flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn second_joiner_waits_for_the_first() {
        let flights = Arc::new(SingleFlight::default());

        let first = flights.join("k").await;

        let contender = {
            let flights = Arc::clone(&flights);
            tokio::spawn(async move {
                let _guard = flights.join("k").await;
            })
        };

        // The contender cannot finish while we hold the key.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(first);
        contender.await.unwrap();
        assert_eq!(flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let flights = SingleFlight::default();

        let a = flights.join("a").await;
        let b = flights.join("b").await;
        assert_eq!(flights.slot_count(), 2);

        drop(a);
        drop(b);
        assert_eq!(flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn refresh_can_only_be_claimed_once() {
        let flights = SingleFlight::default();

        let guard = flights.join("k").await;

        assert!(flights.try_claim_refresh("k").is_some());
        assert!(flights.try_claim_refresh("k").is_none());

        flights.finish_refresh("k");
        assert!(flights.try_claim_refresh("k").is_some());

        flights.finish_refresh("k");
        drop(guard);
        assert_eq!(flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn pending_refresh_keeps_the_slot_alive() {
        let flights = SingleFlight::default();

        let guard = flights.join("k").await;
        let _lock = flights.try_claim_refresh("k").expect("claim should succeed");

        // The foreground caller leaves; the refresh still holds a waiter.
        drop(guard);
        assert_eq!(flights.slot_count(), 1);

        flights.finish_refresh("k");
        assert_eq!(flights.slot_count(), 0);
    }

    #[tokio::test]
    async fn claiming_without_a_slot_returns_none() {
        let flights = SingleFlight::default();
        assert!(flights.try_claim_refresh("ghost").is_none());
    }
}
