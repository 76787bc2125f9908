//! Bookkeeping of every resource the pool owns
//!
//! `all` holds every live id, `idle` the payloads ready for hand-out and
//! `lended` the ids currently out with a caller (or claimed by a dispatcher pass).
//! Every live id is in exactly one of `idle` and `lended`.

use crate::idle_queue::IdleQueue;
use crate::resource::{Lease, ResourceId};

use std::collections::HashSet;

pub(crate) struct Registry<T> {
    all: HashSet<ResourceId>,
    idle: IdleQueue<Lease<T>>,
    lended: HashSet<ResourceId>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            all: HashSet::new(),
            idle: IdleQueue::new(),
            lended: HashSet::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.all.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn lended_count(&self) -> usize {
        self.lended.len()
    }

    pub fn is_lended(&self, id: ResourceId) -> bool {
        self.lended.contains(&id)
    }

    /// Move the longest-idle resource to the lended set
    pub fn checkout_idle(&mut self) -> Option<Lease<T>> {
        let lease = self.idle.dequeue()?;
        self.lended.insert(lease.id);
        Some(lease)
    }

    /// Reserve a slot for a resource that is about to be constructed
    ///
    /// The returned id counts towards `size` and `lended` straight away so
    /// concurrent dispatches cannot overshoot the capacity.
    pub fn reserve(&mut self, max: usize) -> Option<ResourceId> {
        if self.all.len() >= max {
            return None;
        }
        let id = ResourceId::new();
        self.all.insert(id);
        self.lended.insert(id);
        Some(id)
    }

    /// Move a lended resource back to idle
    ///
    /// Hands the lease back if it is not lended from this registry.
    pub fn check_in(&mut self, lease: Lease<T>) -> Result<(), Lease<T>> {
        if !self.lended.remove(&lease.id) {
            return Err(lease);
        }
        self.idle.enqueue(lease);
        Ok(())
    }

    /// Forget a lended resource entirely
    pub fn retire(&mut self, id: ResourceId) -> bool {
        if !self.lended.remove(&id) {
            return false;
        }
        self.all.remove(&id);
        true
    }

    /// Empty the registry, returning every idle payload
    pub fn drain(&mut self) -> Vec<T> {
        self.all.clear();
        self.lended.clear();
        self.idle.drain().map(|lease| lease.payload).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition<T>(registry: &Registry<T>) {
        assert_eq!(
            registry.idle_count() + registry.lended_count(),
            registry.size()
        );
    }

    #[test]
    fn test_reserve_respects_capacity() {
        let mut registry: Registry<u32> = Registry::new();
        assert!(registry.reserve(2).is_some());
        assert!(registry.reserve(2).is_some());
        assert!(registry.reserve(2).is_none());
        assert_eq!(registry.size(), 2);
        assert_eq!(registry.lended_count(), 2);
        assert_partition(&registry);
    }

    #[test]
    fn test_check_in_then_checkout_reuses_resource() {
        let mut registry = Registry::new();
        let id = registry.reserve(1).unwrap();
        assert!(registry.check_in(Lease { id, payload: 7 }).is_ok());
        assert_eq!(registry.idle_count(), 1);
        assert_partition(&registry);

        let lease = registry.checkout_idle().unwrap();
        assert_eq!(lease.id, id);
        assert_eq!(lease.payload, 7);
        assert!(registry.is_lended(id));
        assert_partition(&registry);
    }

    #[test]
    fn test_check_in_unknown_hands_lease_back() {
        let mut registry: Registry<u32> = Registry::new();
        let foreign = Lease {
            id: ResourceId::new(),
            payload: 1,
        };
        let returned = registry.check_in(foreign).unwrap_err();
        assert_eq!(returned.payload, 1);
        assert_eq!(registry.size(), 0);
    }

    #[test]
    fn test_retire_removes_from_all() {
        let mut registry: Registry<u32> = Registry::new();
        let id = registry.reserve(3).unwrap();
        assert!(registry.retire(id));
        assert!(!registry.retire(id));
        assert_eq!(registry.size(), 0);
        assert_partition(&registry);
    }

    #[test]
    fn test_idle_resource_cannot_be_retired() {
        let mut registry = Registry::new();
        let id = registry.reserve(1).unwrap();
        registry.check_in(Lease { id, payload: 0u8 }).ok();
        assert!(!registry.retire(id));
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_drain_returns_idle_payloads() {
        let mut registry = Registry::new();
        for payload in [10, 20] {
            let id = registry.reserve(5).unwrap();
            registry.check_in(Lease { id, payload }).ok();
        }

        assert_eq!(registry.drain(), vec![10, 20]);
        assert_eq!(registry.size(), 0);
        assert_eq!(registry.idle_count(), 0);
    }
}
