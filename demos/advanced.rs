//! Advanced features: custom factories, validation, metrics

use async_trait::async_trait;
use esox_resourcepool::{FactoryError, FnFactory, PoolConfiguration, ResourceFactory, ResourcePool};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
struct Connection {
    id: usize,
    healthy: bool,
}

/// Hands out connections where every third one is broken
struct FlakyConnections {
    next_id: AtomicUsize,
}

#[async_trait]
impl ResourceFactory<Connection> for FlakyConnections {
    async fn create(&self) -> Result<Connection, FactoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Connection {
            id,
            healthy: id % 3 != 0,
        })
    }

    async fn validate(&self, connection: &mut Connection) -> bool {
        connection.healthy
    }

    async fn destroy(&self, connection: Connection) {
        println!("   Closing connection {}", connection.id);
    }
}

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.ResourcePool - Advanced Features ===\n");

    // Example 1: Trait-based factory with validation
    custom_factory().await;

    // Example 2: Failing factory
    failing_factory().await;

    // Example 3: Prometheus metrics
    prometheus_export().await;
}

async fn custom_factory() {
    println!("1. Custom Factory:");

    let pool = ResourcePool::new(
        FlakyConnections {
            next_id: AtomicUsize::new(0),
        },
        PoolConfiguration::new().with_max_resources(5),
    )
    .unwrap();

    let mut held = Vec::new();
    for _ in 0..4 {
        let connection = pool.acquire().await.unwrap();
        println!("   Got connection {}", connection.id);
        held.push(connection);
    }

    for connection in held {
        pool.release(connection).unwrap();
    }

    let metrics = pool.metrics();
    println!(
        "   Created {}, rejected {}, size {}",
        metrics.total_created, metrics.validation_failures, metrics.size
    );
    pool.shutdown().await.unwrap();
    println!();
}

async fn failing_factory() {
    println!("2. Failing Factory:");

    let pool: ResourcePool<String> =
        ResourcePool::new(FnFactory::try_new(|| Err("database unreachable".into())), PoolConfiguration::new()).unwrap();

    match pool.acquire().await {
        Ok(_) => println!("   Got resource"),
        Err(e) => println!("   Error: {} (retryable: {})", e, e.is_retryable()),
    }
    println!();
}

async fn prometheus_export() {
    println!("3. Prometheus Export:");

    let pool = ResourcePool::new(FnFactory::new(|| 0u64), PoolConfiguration::new().with_max_resources(4)).unwrap();
    let resource = pool.acquire().await.unwrap();

    let mut tags = HashMap::new();
    tags.insert("service".to_string(), "api".to_string());
    println!("{}", pool.export_metrics_prometheus("demo_pool", Some(&tags)));

    pool.release(resource).unwrap();
}
