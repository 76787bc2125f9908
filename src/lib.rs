//! # EsoxSolutions.ResourcePool
//!
//! Bounded, fair, async resource pool for Rust. Resources are built on demand
//! by a caller-supplied factory, validated before they are lent, and handed to
//! waiting callers in arrival order.
//!
//! ## Features
//!
//! - Hard upper bound on live resources
//! - FIFO hand-off to waiting callers, with optional backpressure
//! - Acquire timeout and cancellation via `CancellationToken`
//! - Validation before hand-off, with transparent discard-and-retry
//! - Race-safe recovery of resources delivered to callers that gave up
//! - Automatic return of resources via RAII (Drop trait)
//! - Orderly shutdown
//! - Metrics and Prometheus export
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_resourcepool::{FnFactory, PoolConfiguration, ResourcePool};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), esox_resourcepool::PoolError> {
//! let pool = ResourcePool::new(
//!     FnFactory::new(|| Vec::<u8>::with_capacity(1024)),
//!     PoolConfiguration::new().with_max_resources(4),
//! )?;
//!
//! let mut buffer = pool.acquire().await?;
//! buffer.extend_from_slice(b"hello");
//! pool.release(buffer)?;
//!
//! assert_eq!(pool.idle_count(), 1);
//! pool.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatcher;
mod errors;
mod factory;
mod idle_queue;
mod metrics;
mod pool;
mod registry;
mod resource;
mod state;
mod waiters;

pub use config::PoolConfiguration;
pub use errors::{FactoryError, PoolError, PoolResult};
pub use factory::{FnFactory, ResourceFactory};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::ResourcePool;
pub use resource::{Resource, ResourceId};
pub use state::PoolState;

pub use tokio_util::sync::CancellationToken;
