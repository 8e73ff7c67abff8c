// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-through caching of a slow lookup.
//!
//! Run with: `cargo run --example basic`

use std::time::Duration;

use rewarm::{Cache, CancellationToken, FetchResult};
use rewarm_memory::MemoryBackend;

#[derive(Debug)]
struct UserProfile {
    id: u32,
    name: String,
}

async fn fetch_user_profile(user_id: &str) -> Result<UserProfile, rewarm::Error> {
    // Simulate a slow database query.
    tokio::time::sleep(Duration::from_millis(500)).await;

    Ok(UserProfile {
        id: user_id.parse().map_err(rewarm::Error::other)?,
        name: "John Doe".to_string(),
    })
}

#[tokio::main]
async fn main() -> Result<(), rewarm::BoxError> {
    // Small windows so the example finishes quickly.
    let cache = Cache::builder(MemoryBackend::new())
        .ttl(Duration::from_secs(1), Duration::from_secs(3))
        .build()?;
    let ctx = CancellationToken::new();

    let fetch = |_ctx: CancellationToken, key: String| async move {
        let profile = fetch_user_profile(&key).await?;
        Ok(FetchResult::new(profile))
    };

    // First call fetches and stores the profile.
    let hit = cache.get(&ctx, "1", fetch).await?;
    println!("{:?}: {:?}", hit.outcome, hit.data);

    // Served straight from the backend, no fetch.
    let hit = cache.get(&ctx, "1", fetch).await?;
    println!("{:?}: {:?}", hit.outcome, hit.data);

    // After the primary TTL the cached profile is still served, while a
    // background refresh replaces it.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let hit = cache.get(&ctx, "1", fetch).await?;
    println!("{:?}: {:?}", hit.outcome, hit.data);

    // Drain the refresh before the process exits.
    cache.close().await;

    Ok(())
}
