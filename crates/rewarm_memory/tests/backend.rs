// Copyright (c) Microsoft Corporation.

//! Tests for the in-memory backend.

use std::time::Duration;

use rewarm_backend::{Backend, Entry, Error};
use rewarm_memory::MemoryBackend;

#[tokio::test]
async fn absent_key_is_none_not_an_error() {
    let backend = MemoryBackend::<String>::new();
    assert!(backend.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn set_then_get_preserves_the_entry() {
    let backend = MemoryBackend::<String>::new();
    let entry = Entry::ok("value".to_string());

    backend.set("k", Duration::from_secs(60), entry.clone()).await.unwrap();

    let stored = backend.get("k").await.unwrap().expect("entry should be present");
    assert_eq!(stored.data().map(|v| v.as_str()), Some("value"));
    assert_eq!(stored.created(), entry.created());
    assert!(stored.error().is_none());
}

#[tokio::test]
async fn error_entries_round_trip() {
    let backend = MemoryBackend::<String>::new();
    let entry = Entry::err(Error::message("bad upstream"), Duration::from_secs(30));

    backend.set("k", Duration::from_secs(60), entry).await.unwrap();

    let stored = backend.get("k").await.unwrap().expect("entry should be present");
    assert!(stored.data().is_none());
    assert_eq!(stored.error().map(ToString::to_string), Some("bad upstream".to_string()));
    assert!(stored.fixed_expiration().is_some());
}

#[tokio::test]
async fn the_ttl_hint_is_ignored() {
    let backend = MemoryBackend::<String>::new();

    backend
        .set("k", Duration::from_millis(1), Entry::ok("sticky".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    // Still present: the backend does not expire entries on its own. Whether
    // the entry is *serviceable* is the cache's call, not the backend's.
    let stored = backend.get("k").await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn overwrite_replaces_the_entry() {
    let backend = MemoryBackend::<i32>::new();

    backend.set("k", Duration::from_secs(60), Entry::ok(1)).await.unwrap();
    backend.set("k", Duration::from_secs(60), Entry::ok(2)).await.unwrap();

    let stored = backend.get("k").await.unwrap().unwrap();
    assert_eq!(stored.data().map(|v| **v), Some(2));
    assert_eq!(backend.entry_count(), 1);
}

#[tokio::test]
async fn clones_share_storage() {
    let backend = MemoryBackend::<i32>::new();
    let other = backend.clone();

    backend.set("k", Duration::from_secs(60), Entry::ok(7)).await.unwrap();

    let stored = other.get("k").await.unwrap().unwrap();
    assert_eq!(stored.data().map(|v| **v), Some(7));
}
