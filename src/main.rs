// EsoxSolutions.ResourcePool
// Bounded, fair, async resource pool

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_resourcepool::{FnFactory, PoolConfiguration, PoolResult, ResourcePool};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== EsoxSolutions.ResourcePool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let counter = AtomicUsize::new(0);
    let pool = ResourcePool::new(
        FnFactory::new(move || format!("connection-{}", counter.fetch_add(1, Ordering::Relaxed))),
        PoolConfiguration::new().with_max_resources(2),
    )?;

    let connection = pool.acquire().await?;
    println!("  Got resource: {}", *connection);
    pool.release(connection)?;

    println!("  Idle after release: {}", pool.idle_count());
    pool.shutdown().await?;
    println!("  Pool state: {}", pool.state());

    Ok(())
}
