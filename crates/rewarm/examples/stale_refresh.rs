// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Stale-while-revalidate walkthrough: watch a key go hot, warm, and fresh
//! again without any caller ever waiting on the refresh.
//!
//! Run with: `cargo run --example stale_refresh`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rewarm::{Cache, CancellationToken, FetchResult, Outcome};
use rewarm_memory::MemoryBackend;

#[tokio::main]
async fn main() -> Result<(), rewarm::BoxError> {
    let versions = Arc::new(AtomicUsize::new(0));

    let cache = Cache::builder(MemoryBackend::new())
        .ttl(Duration::from_secs(1), Duration::from_secs(10))
        .background_error_handler(|err| eprintln!("background refresh failed: {err}"))
        .build()?;
    let ctx = CancellationToken::new();

    let make_fetch = |versions: Arc<AtomicUsize>| {
        move |_ctx: CancellationToken, key: String| async move {
            let version = versions.fetch_add(1, Ordering::SeqCst) + 1;
            println!("[fetch] computing version {version} for '{key}'...");
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(FetchResult::new(format!("content v{version}")))
        }
    };

    println!("--- Step 1: initial load ---");
    let hit = cache.get(&ctx, "page", make_fetch(versions.clone())).await?;
    assert_eq!(hit.outcome, Outcome::Miss);
    println!("received: {:?}", hit.data);

    println!("--- Step 2: fresh hit, no fetch ---");
    let hit = cache.get(&ctx, "page", make_fetch(versions.clone())).await?;
    assert_eq!(hit.outcome, Outcome::HotHit);
    println!("received: {:?}", hit.data);

    println!("--- Step 3: wait for the primary TTL to pass ---");
    tokio::time::sleep(Duration::from_millis(1100)).await;

    println!("--- Step 4: stale read, refresh starts behind it ---");
    let hit = cache.get(&ctx, "page", make_fetch(versions.clone())).await?;
    assert_eq!(hit.outcome, Outcome::WarmHit);
    println!("received immediately (stale): {:?}", hit.data);

    println!("--- Step 5: wait for the background refresh ---");
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("fetches so far: {}", versions.load(Ordering::SeqCst));

    println!("--- Step 6: fresh again ---");
    let hit = cache.get(&ctx, "page", make_fetch(versions.clone())).await?;
    assert_eq!(hit.outcome, Outcome::HotHit);
    println!("received (refreshed): {:?}", hit.data);

    cache.close().await;
    Ok(())
}
