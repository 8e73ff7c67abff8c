// Copyright (c) Microsoft Corporation.

//! Builder validation tests.

use std::time::Duration;

use rewarm::{Cache, Error};
use rewarm_backend::testing::MockBackend;

#[test]
fn defaults_build() {
    let cache = Cache::<String, _>::builder(MockBackend::new()).build();
    assert!(cache.is_ok());
}

#[test]
fn zero_primary_ttl_is_rejected() {
    let err = Cache::<String, _>::builder(MockBackend::new())
        .ttl(Duration::ZERO, Duration::from_secs(10))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("primary TTL"), "got: {err}");
}

#[test]
fn secondary_ttl_must_exceed_primary() {
    let err = Cache::<String, _>::builder(MockBackend::new())
        .ttl(Duration::from_secs(10), Duration::from_secs(10))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("secondary TTL"), "got: {err}");
}

#[test]
fn zero_background_fetch_timeout_is_rejected() {
    let err = Cache::<String, _>::builder(MockBackend::new())
        .background_fetch_timeout(Duration::ZERO)
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("background fetch timeout"), "got: {err}");
}

#[test]
fn config_errors_display_as_invalid_config() {
    let err = Cache::<String, _>::builder(MockBackend::new())
        .ttl(Duration::ZERO, Duration::ZERO)
        .build()
        .unwrap_err();

    assert!(err.to_string().starts_with("invalid config:"), "got: {err}");
}
