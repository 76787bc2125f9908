//! Basic usage examples for ResourcePool

use esox_resourcepool::{FnFactory, PoolConfiguration, ResourcePool};
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.ResourcePool - Basic Examples ===\n");

    // Example 1: Acquire and release
    acquire_and_release().await;

    // Example 2: Automatic return on drop
    automatic_return().await;

    // Example 3: Destroying a resource
    destroy_resource().await;

    // Example 4: Shutdown
    shutdown().await;
}

fn numbered_pool(max: usize) -> ResourcePool<usize> {
    let counter = AtomicUsize::new(0);
    ResourcePool::new(
        FnFactory::new(move || counter.fetch_add(1, Ordering::Relaxed) + 1),
        PoolConfiguration::new().with_max_resources(max),
    )
    .unwrap()
}

async fn acquire_and_release() {
    println!("1. Acquire and Release:");
    let pool = numbered_pool(2);

    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();
    println!("   Got resources: {} and {}", *first, *second);

    pool.release(first).unwrap();
    let third = pool.acquire().await.unwrap();
    println!("   Reused resource: {} (size {})", *third, pool.size());

    pool.release(second).unwrap();
    pool.release(third).unwrap();
    println!();
}

async fn automatic_return() {
    println!("2. Automatic Return:");
    let pool = numbered_pool(1);

    {
        let resource = pool.acquire().await.unwrap();
        println!("   Lended: {} (resource {})", pool.lended_count(), *resource);
        // Resource automatically returned when dropped
    }

    println!("   Idle after drop: {}\n", pool.idle_count());
}

async fn destroy_resource() {
    println!("3. Destroy:");
    let pool = numbered_pool(1);

    let resource = pool.acquire().await.unwrap();
    pool.destroy(resource).await.unwrap();
    println!("   Size after destroy: {}", pool.size());

    let replacement = pool.acquire().await.unwrap();
    println!("   Replacement resource: {}\n", *replacement);
}

async fn shutdown() {
    println!("4. Shutdown:");
    let pool = numbered_pool(2);

    let resource = pool.acquire().await.unwrap();
    match pool.shutdown().await {
        Ok(()) => println!("   Shut down"),
        Err(e) => println!("   Refused: {}", e),
    }

    pool.release(resource).unwrap();
    pool.shutdown().await.unwrap();
    println!("   State: {}, size: {}", pool.state(), pool.size());
    println!("   Acquire afterwards: {:?}", pool.acquire().await.err());
}
