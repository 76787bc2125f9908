//! Waiting, timeouts, cancellation and backpressure

use esox_resourcepool::{CancellationToken, FnFactory, PoolConfiguration, ResourcePool};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.ResourcePool - Async Examples ===\n");

    // Example 1: Acquire timeout
    acquire_timeout().await;

    // Example 2: Cancellation
    cancellation().await;

    // Example 3: Backpressure
    backpressure().await;

    // Example 4: Concurrent access
    concurrent_access().await;
}

async fn acquire_timeout() {
    println!("1. Acquire Timeout:");

    let config = PoolConfiguration::new()
        .with_max_resources(1)
        .with_acquire_timeout(Duration::from_millis(100));
    let pool = ResourcePool::new(FnFactory::new(|| 42), config).unwrap();

    // Take the only resource
    let _held = pool.acquire().await.unwrap();

    // Try to get another (should time out)
    match pool.acquire().await {
        Ok(_) => println!("   Got resource"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
}

async fn cancellation() {
    println!("2. Cancellation:");

    let pool = ResourcePool::new(FnFactory::new(|| 42), PoolConfiguration::new().with_max_resources(1)).unwrap();
    let _held = pool.acquire().await.unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    match pool.acquire_with_cancellation(&token).await {
        Ok(_) => println!("   Got resource"),
        Err(e) => println!("   Error: {}", e),
    }
    println!("   Waiting after cancel: {}\n", pool.waiting_count());
}

async fn backpressure() {
    println!("3. Backpressure:");

    let config = PoolConfiguration::new()
        .with_max_resources(1)
        .with_max_waiting_clients(1);
    let pool = ResourcePool::new(FnFactory::new(|| 42), config).unwrap();
    let held = pool.acquire().await.unwrap();

    let waiting = pool.clone();
    let waiter = tokio::spawn(async move { waiting.acquire().await.map(|r| *r) });
    sleep(Duration::from_millis(10)).await;

    match pool.acquire().await {
        Ok(_) => println!("   Got resource"),
        Err(e) => println!("   Error: {}", e),
    }

    pool.release(held).unwrap();
    println!("   Queued caller got: {:?}\n", waiter.await.unwrap());
}

async fn concurrent_access() {
    println!("4. Concurrent Access:");

    let pool = Arc::new(
        ResourcePool::new(FnFactory::new(|| String::from("conn")), PoolConfiguration::new().with_max_resources(3))
            .unwrap(),
    );

    let mut handles = vec![];

    for i in 0..10 {
        let pool_clone = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            let resource = pool_clone.acquire().await.unwrap();
            println!("   Task {} got {} {}", i, *resource, resource.id());
            sleep(Duration::from_millis(20)).await;
            pool_clone.release(resource).unwrap();
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final size: {}, idle: {}", pool.size(), pool.idle_count());
}
