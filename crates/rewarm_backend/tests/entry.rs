// Copyright (c) Microsoft Corporation.

//! Tests for entry construction and expiry semantics.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use rewarm_backend::{Entry, Error};

#[test]
fn ok_entry_holds_data_and_no_error() {
    let entry = Entry::ok("value".to_string());

    assert_eq!(entry.data().map(|v| v.as_str()), Some("value"));
    assert!(entry.error().is_none());
    assert!(entry.fixed_expiration().is_none());
}

#[test]
fn ok_at_keeps_the_given_creation_time() {
    let created = Utc::now() - TimeDelta::minutes(5);
    let entry = Entry::ok_at(42, created);

    assert_eq!(entry.created(), created);
    assert!(entry.is_expired(Duration::from_secs(60)));
    assert!(!entry.is_expired(Duration::from_secs(600)));
}

#[test]
fn err_entry_holds_error_and_no_data() {
    let entry = Entry::<String>::err(Error::message("boom"), Duration::from_secs(60));

    assert!(entry.data().is_none());
    assert_eq!(entry.error().map(ToString::to_string), Some("boom".to_string()));
    assert!(entry.fixed_expiration().is_some());
}

#[test]
fn empty_expired_is_expired_for_any_ttl() {
    let entry = Entry::<String>::empty_expired();

    // The sentinel's fixed expiration is its creation instant, so by the time
    // anyone asks, it lies in the past.
    std::thread::sleep(Duration::from_millis(5));
    assert!(entry.is_expired(Duration::from_secs(3600)));
    assert!(entry.is_expired(Duration::ZERO));
    assert!(entry.data().is_none());
    assert!(entry.error().is_none());
}

#[test]
fn zero_ttl_expires_any_entry_without_fixed_expiration() {
    let entry = Entry::ok(1);
    std::thread::sleep(Duration::from_millis(2));
    assert!(entry.is_expired(Duration::ZERO));
}

#[test]
fn fixed_expiration_in_past_wins_over_generous_ttl() {
    let entry = Entry::from_parts(
        Some(std::sync::Arc::new(true)),
        None,
        Utc::now(),
        Some(Utc::now() - TimeDelta::minutes(1)),
    );

    assert!(entry.is_expired(Duration::from_secs(30)));
}

#[test]
fn fixed_expiration_in_future_wins_over_zero_ttl() {
    let entry = Entry::from_parts(
        Some(std::sync::Arc::new(true)),
        None,
        Utc::now(),
        Some(Utc::now() + TimeDelta::minutes(1)),
    );

    assert!(!entry.is_expired(Duration::ZERO));
}

#[test]
fn created_in_past_expires_by_ttl() {
    let created = Utc::now() - TimeDelta::minutes(1);
    let entry = Entry::ok_at(true, created);

    assert!(entry.is_expired(Duration::from_secs(30)));
    assert!(!entry.is_expired(Duration::from_secs(120)));
}

#[test]
fn huge_ttl_never_expires() {
    let entry = Entry::ok(1);
    assert!(!entry.is_expired(Duration::MAX));
}

#[test]
fn clone_shares_the_value() {
    let entry = Entry::ok("shared".to_string());
    let cloned = entry.clone();

    let original = entry.data().expect("entry should hold data");
    let copy = cloned.data().expect("clone should hold data");
    assert!(std::sync::Arc::ptr_eq(original, copy));
}
