//! Matching waiting callers with resources
//!
//! A dispatcher pass runs as a background task after every acquire, release,
//! destroy and shutdown. Registry bookkeeping happens under the pool lock;
//! factory calls and the hand-off itself happen outside it.
//!
//! A pass claims a resource only while there are more waiters than passes
//! already holding one (`in_flight`), so bursts of triggers never build more
//! resources than callers need. The claimed resource goes to whoever is at the
//! head of the queue when it is ready, which keeps waiters strictly FIFO.

use crate::errors::PoolError;
use crate::metrics::MetricsTracker;
use crate::pool::{Inner, Shared};
use crate::resource::{Lease, ResourceId};

use std::sync::Arc;

/// What a dispatcher pass is holding on to
enum Claim<T> {
    /// An idle resource, now marked lended
    Idle(Lease<T>),
    /// A reserved slot; the resource still has to be built
    Fresh(ResourceId),
}

impl<T> Claim<T> {
    /// Take an idle resource, or reserve capacity for a new one
    fn take(inner: &mut Inner<T>, max: usize) -> Option<Self> {
        if let Some(lease) = inner.registry.checkout_idle() {
            return Some(Claim::Idle(lease));
        }
        inner.registry.reserve(max).map(Claim::Fresh)
    }
}

impl<T: Send + 'static> Shared<T> {
    /// Schedule a dispatcher pass without waiting for it
    pub(crate) fn trigger_dispatch(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.runtime.spawn(async move { shared.dispatch().await });
    }

    async fn dispatch(self: Arc<Self>) {
        let Some(mut claim) = self.claim() else {
            return;
        };
        let mut rejections = 0usize;

        loop {
            let mut lease = match claim {
                Claim::Idle(lease) => {
                    tracing::debug!(resource_id = %lease.id, "reusing idle resource");
                    lease
                }
                Claim::Fresh(id) => match self.factory.create().await {
                    Ok(payload) => {
                        MetricsTracker::increment(&self.metrics.total_created);
                        tracing::debug!(resource_id = %id, "created resource");
                        Lease { id, payload }
                    }
                    Err(err) => {
                        MetricsTracker::increment(&self.metrics.factory_failures);
                        tracing::warn!(error = %err, "resource factory failed to create a resource");
                        self.forget_reservation(id);
                        self.fail_head(PoolError::Factory(err.to_string()));
                        return;
                    }
                },
            };

            if self.factory.validate(&mut lease.payload).await {
                self.deliver(lease);
                return;
            }

            rejections += 1;
            MetricsTracker::increment(&self.metrics.validation_failures);
            tracing::debug!(resource_id = %lease.id, rejections, "resource failed validation");
            self.discard(lease).await;

            if let Some(limit) = self.config.max_validation_attempts
                && rejections >= limit
            {
                tracing::warn!(rejections, "giving up on validation for the waiting client");
                self.fail_head(PoolError::ValidationFailed);
                return;
            }

            tokio::task::yield_now().await;
            match self.claim_retry() {
                Some(next) => claim = next,
                None => return,
            }
        }
    }

    /// Claim a resource for a waiter that no other pass is serving yet
    fn claim(&self) -> Option<Claim<T>> {
        let mut inner = self.inner.lock();

        if !inner.state.is_active() {
            let closed = inner.waiters.close_all();
            if closed > 0 {
                tracing::debug!(closed, "closed waiters of an inactive pool");
            }
            return None;
        }

        if inner.waiters.len() <= inner.in_flight {
            return None;
        }

        let claim = Claim::take(&mut inner, self.config.max_resources)?;
        inner.in_flight += 1;
        Some(claim)
    }

    /// Claim another resource for the same waiter after a validation failure
    ///
    /// Gives up the pass if its waiter has gone away or nothing can be claimed.
    fn claim_retry(self: &Arc<Self>) -> Option<Claim<T>> {
        let claim = {
            let mut inner = self.inner.lock();
            let abandoned = !inner.state.is_active() || inner.waiters.len() < inner.in_flight;
            let claim = if abandoned {
                None
            } else {
                Claim::take(&mut inner, self.config.max_resources)
            };
            if claim.is_none() {
                inner.in_flight -= 1;
            }
            claim
        };

        if claim.is_none() {
            self.trigger_dispatch();
        }
        claim
    }

    /// Hand a validated resource to the longest-waiting caller
    fn deliver(self: &Arc<Self>, lease: Lease<T>) {
        let waiter = {
            let mut inner = self.inner.lock();
            inner.in_flight -= 1;
            inner.waiters.pop_front()
        };

        let Some(waiter) = waiter else {
            tracing::debug!(resource_id = %lease.id, "no waiter left, returning resource to idle");
            self.reclaim(lease);
            return;
        };

        let id = lease.id;
        match waiter.send(Ok(lease)) {
            Ok(()) => tracing::debug!(resource_id = %id, "resource handed off"),
            Err(returned) => {
                tracing::debug!(resource_id = %id, "waiter gave up during hand-off, returning resource to idle");
                if let Ok(lease) = returned {
                    self.reclaim(lease);
                }
            }
        }
    }

    /// Fail the longest-waiting caller and let the others carry on
    fn fail_head(self: &Arc<Self>, err: PoolError) {
        let waiter = {
            let mut inner = self.inner.lock();
            inner.in_flight -= 1;
            inner.waiters.pop_front()
        };

        if let Some(waiter) = waiter {
            // A waiter that already gave up has nothing to recover
            let _ = waiter.send(Err(err));
        }
        self.trigger_dispatch();
    }

    /// Release the capacity reserved for a resource that was never built
    fn forget_reservation(&self, id: ResourceId) {
        self.inner.lock().registry.retire(id);
    }

    /// Destroy a resource that failed validation
    async fn discard(&self, lease: Lease<T>) {
        self.inner.lock().registry.retire(lease.id);
        self.factory.destroy(lease.payload).await;
        MetricsTracker::increment(&self.metrics.total_destroyed);
    }
}
