//! The resource pool: acquire, release, destroy and shutdown

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::factory::ResourceFactory;
use crate::metrics::{Gauges, MetricsExporter, MetricsTracker, PoolMetrics};
use crate::registry::Registry;
use crate::resource::{Lease, Resource};
use crate::state::PoolState;
use crate::waiters::{Delivery, Ticket, WaitingClients};

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Everything guarded by the pool lock
pub(crate) struct Inner<T> {
    pub registry: Registry<T>,
    pub waiters: WaitingClients<T>,
    pub state: PoolState,
    /// Dispatcher passes currently holding a claimed resource for some waiter
    pub in_flight: usize,
}

impl<T> Inner<T> {
    fn ensure_active(&self) -> PoolResult<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(PoolError::Inactive)
        }
    }

    fn gauges(&self) -> Gauges {
        Gauges {
            size: self.registry.size(),
            idle: self.registry.idle_count(),
            lended: self.registry.lended_count(),
            waiting: self.waiters.len(),
        }
    }
}

/// State shared between pool handles, lent resources and dispatcher tasks
pub(crate) struct Shared<T: Send + 'static> {
    pub inner: Mutex<Inner<T>>,
    pub factory: Box<dyn ResourceFactory<T>>,
    pub config: PoolConfiguration,
    pub metrics: MetricsTracker,
    pub runtime: Handle,
}

impl<T: Send + 'static> Shared<T> {
    /// Put a lended resource back into idle and wake the dispatcher
    ///
    /// Resources that are no longer lended here (pool shut down) are dropped.
    pub(crate) fn reclaim(self: &Arc<Self>, lease: Lease<T>) -> bool {
        let rejected = {
            let mut inner = self.inner.lock();
            if inner.state.is_active() {
                inner.registry.check_in(lease).err()
            } else {
                Some(lease)
            }
        };

        match rejected {
            Some(lease) => {
                tracing::debug!(resource_id = %lease.id, "dropping resource that is no longer tracked");
                false
            }
            None => {
                self.trigger_dispatch();
                true
            }
        }
    }
}

/// Thread-safe, bounded pool of resources built on demand by a [`ResourceFactory`]
///
/// Callers borrow resources with [`acquire`](ResourcePool::acquire) and hand
/// them back with [`release`](ResourcePool::release) or
/// [`destroy`](ResourcePool::destroy). Waiting callers are served in arrival
/// order. Cloning the pool yields another handle to the same pool.
///
/// # Examples
///
/// ```
/// use esox_resourcepool::{FnFactory, PoolConfiguration, ResourcePool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), esox_resourcepool::PoolError> {
/// let pool = ResourcePool::new(
///     FnFactory::new(|| String::from("connection")),
///     PoolConfiguration::new().with_max_resources(2),
/// )?;
///
/// let first = pool.acquire().await?;
/// let id = first.id();
/// pool.release(first)?;
///
/// let again = pool.acquire().await?;
/// assert_eq!(again.id(), id);
/// assert_eq!(pool.size(), 1);
/// # pool.release(again)?;
/// # Ok(())
/// # }
/// ```
pub struct ResourcePool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + 'static> ResourcePool<T> {
    /// Create a new pool
    ///
    /// Must be called from within a Tokio runtime; dispatching runs as
    /// background tasks on that runtime.
    pub fn new<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: ResourceFactory<T>,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        tracing::info!(
            max_resources = config.max_resources,
            max_waiting_clients = ?config.max_waiting_clients,
            acquire_timeout = ?config.acquire_timeout,
            "resource pool created"
        );

        let inner = Inner {
            registry: Registry::new(),
            waiters: WaitingClients::new(config.max_waiting_clients),
            state: PoolState::Active,
            in_flight: 0,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                factory: Box::new(factory),
                config,
                metrics: MetricsTracker::new(),
                runtime,
            }),
        })
    }

    /// Borrow a resource, waiting for one if necessary
    ///
    /// Waits at most the configured acquire timeout. Dropping the returned
    /// future withdraws the request; a resource already on its way is put back.
    pub async fn acquire(&self) -> PoolResult<Resource<T>> {
        self.acquire_inner(None).await
    }

    /// Like [`acquire`](ResourcePool::acquire), but also gives up once `cancellation` fires
    pub async fn acquire_with_cancellation(
        &self,
        cancellation: &CancellationToken,
    ) -> PoolResult<Resource<T>> {
        self.acquire_inner(Some(cancellation)).await
    }

    async fn acquire_inner(&self, cancellation: Option<&CancellationToken>) -> PoolResult<Resource<T>> {
        let (ticket, receiver) = {
            let mut inner = self.shared.inner.lock();
            inner.ensure_active()?;
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                MetricsTracker::increment(&self.shared.metrics.acquire_cancellations);
                return Err(PoolError::Cancelled);
            }
            match inner.waiters.push() {
                Ok(registered) => registered,
                Err(err) => {
                    MetricsTracker::increment(&self.shared.metrics.backpressure_rejections);
                    tracing::debug!(waiting = inner.waiters.len(), "acquire rejected by backpressure");
                    return Err(err);
                }
            }
        };

        let mut pending = PendingAcquire {
            shared: Arc::clone(&self.shared),
            ticket,
            receiver: Some(receiver),
        };
        self.shared.trigger_dispatch();

        let timeout = self.shared.config.acquire_timeout;
        match pending.wait(timeout, cancellation).await {
            Wake::Delivered(delivery) => {
                pending.disarm();
                match delivery {
                    Some(Ok(lease)) => {
                        MetricsTracker::increment(&self.shared.metrics.total_acquired);
                        Ok(Resource::new(lease, Arc::downgrade(&self.shared)))
                    }
                    Some(Err(err)) => Err(err),
                    None => Err(PoolError::NoResourceAvailable),
                }
            }
            Wake::TimedOut(after) => {
                drop(pending);
                MetricsTracker::increment(&self.shared.metrics.acquire_timeouts);
                Err(PoolError::Timeout(after))
            }
            Wake::Cancelled => {
                drop(pending);
                MetricsTracker::increment(&self.shared.metrics.acquire_cancellations);
                Err(PoolError::Cancelled)
            }
        }
    }

    /// Return a borrowed resource to the pool
    ///
    /// Fails with [`PoolError::UnknownResource`] if the resource was not lent
    /// by this pool. Such a resource still goes back to its own pool when it is dropped.
    pub fn release(&self, mut resource: Resource<T>) -> PoolResult<()> {
        let id = resource.id();
        {
            let mut inner = self.shared.inner.lock();
            inner.ensure_active()?;
            if !inner.registry.is_lended(id) {
                return Err(PoolError::UnknownResource(id));
            }
            let lease = resource.take_lease().ok_or(PoolError::UnknownResource(id))?;
            if inner.registry.check_in(lease).is_err() {
                return Err(PoolError::UnknownResource(id));
            }
        }

        MetricsTracker::increment(&self.shared.metrics.total_released);
        tracing::debug!(resource_id = %id, "resource released");
        self.shared.trigger_dispatch();
        Ok(())
    }

    /// Remove a borrowed resource from the pool for good
    ///
    /// The factory's `destroy` runs after the pool lock has been released.
    pub async fn destroy(&self, mut resource: Resource<T>) -> PoolResult<()> {
        let id = resource.id();
        let lease = {
            let mut inner = self.shared.inner.lock();
            inner.ensure_active()?;
            if !inner.registry.is_lended(id) {
                return Err(PoolError::UnknownResource(id));
            }
            let lease = resource.take_lease().ok_or(PoolError::UnknownResource(id))?;
            inner.registry.retire(id);
            lease
        };

        self.shared.factory.destroy(lease.payload).await;
        MetricsTracker::increment(&self.shared.metrics.total_destroyed);
        tracing::debug!(resource_id = %id, "resource destroyed");
        self.shared.trigger_dispatch();
        Ok(())
    }

    /// Shut the pool down, destroying every resource it owns
    ///
    /// Refuses with [`PoolError::OutstandingLendedResources`] while anything is
    /// lended and leaves the pool untouched in that case. Afterwards every
    /// operation fails with [`PoolError::Inactive`].
    pub async fn shutdown(&self) -> PoolResult<()> {
        let (payloads, closed) = {
            let mut inner = self.shared.inner.lock();
            inner.ensure_active()?;
            let lended = inner.registry.lended_count();
            if lended > 0 {
                return Err(PoolError::OutstandingLendedResources(lended));
            }
            inner.state = PoolState::Inactive;
            let closed = inner.waiters.close_all();
            (inner.registry.drain(), closed)
        };

        let destroyed = payloads.len();
        for payload in payloads {
            self.shared.factory.destroy(payload).await;
            MetricsTracker::increment(&self.shared.metrics.total_destroyed);
        }

        tracing::info!(destroyed, closed_waiters = closed, "resource pool shut down");
        self.shared.trigger_dispatch();
        Ok(())
    }

    /// Number of live resources (idle + lended)
    pub fn size(&self) -> usize {
        self.shared.inner.lock().registry.size()
    }

    /// Number of resources currently lended
    pub fn lended_count(&self) -> usize {
        self.shared.inner.lock().registry.lended_count()
    }

    /// Number of resources ready to be handed out
    pub fn idle_count(&self) -> usize {
        self.shared.inner.lock().registry.idle_count()
    }

    /// Number of callers blocked in `acquire`
    pub fn waiting_count(&self) -> usize {
        self.shared.inner.lock().waiters.len()
    }

    /// Whether the pool is still active or has been shut down
    pub fn state(&self) -> PoolState {
        self.shared.inner.lock().state
    }

    /// Configured upper bound on live resources
    pub fn max_resources(&self) -> usize {
        self.shared.config.max_resources
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        let gauges = self.shared.inner.lock().gauges();
        self.shared
            .metrics
            .get_metrics(gauges, self.shared.config.max_resources)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }
}

enum Wake<T> {
    /// `None` when the hand-off channel was closed without a value
    Delivered(Option<Delivery<T>>),
    TimedOut(Duration),
    Cancelled,
}

/// A registered waiter that withdraws itself unless disarmed
///
/// Dropping it covers timeout, cancellation and the acquire future being
/// dropped: the queue entry is removed, or, if the dispatcher already took it,
/// the channel is closed and any resource that made it through is reclaimed.
struct PendingAcquire<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    ticket: Ticket,
    receiver: Option<oneshot::Receiver<Delivery<T>>>,
}

impl<T: Send + 'static> PendingAcquire<T> {
    async fn wait(&mut self, timeout: Option<Duration>, cancellation: Option<&CancellationToken>) -> Wake<T> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Wake::Delivered(None);
        };

        let expired = async {
            match timeout {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    after
                }
                None => future::pending().await,
            }
        };
        let cancelled = async {
            match cancellation {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            biased;
            delivery = receiver => Wake::Delivered(delivery.ok()),
            _ = cancelled => Wake::Cancelled,
            after = expired => Wake::TimedOut(after),
        }
    }

    fn disarm(&mut self) {
        self.receiver = None;
    }
}

impl<T: Send + 'static> Drop for PendingAcquire<T> {
    fn drop(&mut self) {
        let Some(mut receiver) = self.receiver.take() else {
            return;
        };

        let withdrawn = self.shared.inner.lock().waiters.remove(self.ticket);
        if withdrawn {
            return;
        }

        receiver.close();
        if let Ok(Ok(lease)) = receiver.try_recv() {
            tracing::debug!(resource_id = %lease.id, "recovering resource handed to an abandoned acquire");
            self.shared.reclaim(lease);
        }
    }
}
