//! Resource handles lent out by the pool

use crate::metrics::MetricsTracker;
use crate::pool::Shared;

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Weak;
use uuid::Uuid;

/// Stable identity of a pooled resource
///
/// Assigned when the resource is constructed and never reused, even across pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceId(Uuid);

impl ResourceId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A resource payload together with the id the pool tracks it by
pub(crate) struct Lease<T> {
    pub id: ResourceId,
    pub payload: T,
}

/// A resource borrowed from a [`ResourcePool`](crate::ResourcePool)
///
/// Hand it back with [`ResourcePool::release`](crate::ResourcePool::release) or
/// [`ResourcePool::destroy`](crate::ResourcePool::destroy). A resource that is
/// simply dropped is released back to its pool automatically.
pub struct Resource<T: Send + 'static> {
    id: ResourceId,
    lease: Option<Lease<T>>,
    pool: Weak<Shared<T>>,
}

impl<T: Send + 'static> Resource<T> {
    pub(crate) fn new(lease: Lease<T>, pool: Weak<Shared<T>>) -> Self {
        Self {
            id: lease.id,
            lease: Some(lease),
            pool,
        }
    }

    /// Identity of this resource
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Take the payload out so it no longer returns on drop
    pub(crate) fn take_lease(&mut self) -> Option<Lease<T>> {
        self.lease.take()
    }
}

impl<T: Send + 'static> Deref for Resource<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.lease.as_ref().expect("Resource already returned").payload
    }
}

impl<T: Send + 'static> DerefMut for Resource<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.lease.as_mut().expect("Resource already returned").payload
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("payload", &self.lease.as_ref().map(|lease| &lease.payload))
            .finish()
    }
}

impl<T: Send + 'static> Drop for Resource<T> {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            match self.pool.upgrade() {
                Some(shared) => {
                    tracing::debug!(resource_id = %lease.id, "resource dropped while lended, returning it");
                    if shared.reclaim(lease) {
                        MetricsTracker::increment(&shared.metrics.total_released);
                    }
                }
                None => {
                    tracing::debug!(resource_id = %lease.id, "resource outlived its pool");
                }
            }
        }
    }
}
