//! Queue of callers blocked in `acquire`
//!
//! Each waiter owns the receiving half of a one-shot hand-off channel. The
//! dispatcher always serves the head of the queue.

use crate::errors::{PoolError, PoolResult};
use crate::resource::Lease;

use std::collections::VecDeque;
use tokio::sync::oneshot;

/// What a waiter receives: a resource or the reason it will never get one
pub(crate) type Delivery<T> = PoolResult<Lease<T>>;

/// Position of a waiter, used to withdraw it after a timeout or cancellation
pub(crate) type Ticket = u64;

struct Waiter<T> {
    ticket: Ticket,
    sender: oneshot::Sender<Delivery<T>>,
}

pub(crate) struct WaitingClients<T> {
    queue: VecDeque<Waiter<T>>,
    next_ticket: Ticket,
    limit: Option<usize>,
}

impl<T> WaitingClients<T> {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            next_ticket: 0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Append a waiter, refusing it when the queue is already at its limit
    pub fn push(&mut self) -> PoolResult<(Ticket, oneshot::Receiver<Delivery<T>>)> {
        if let Some(limit) = self.limit
            && self.queue.len() >= limit
        {
            return Err(PoolError::BackpressureExceeded(self.queue.len()));
        }

        let (sender, receiver) = oneshot::channel();
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.queue.push_back(Waiter { ticket, sender });
        Ok((ticket, receiver))
    }

    /// Take the longest-waiting caller's hand-off channel
    pub fn pop_front(&mut self) -> Option<oneshot::Sender<Delivery<T>>> {
        self.queue.pop_front().map(|waiter| waiter.sender)
    }

    /// Withdraw a waiter; `false` if it was already taken by the dispatcher
    pub fn remove(&mut self, ticket: Ticket) -> bool {
        match self.queue.iter().position(|waiter| waiter.ticket == ticket) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every hand-off channel so all waiters see "no resource available"
    pub fn close_all(&mut self) -> usize {
        let closed = self.queue.len();
        self.queue.clear();
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;

    #[test]
    fn test_backpressure_limit() {
        let mut waiters: WaitingClients<u8> = WaitingClients::new(Some(2));
        let _first = waiters.push().unwrap();
        let _second = waiters.push().unwrap();

        assert!(matches!(
            waiters.push(),
            Err(PoolError::BackpressureExceeded(2))
        ));
        assert_eq!(waiters.len(), 2);
    }

    #[test]
    fn test_unbounded_queue() {
        let mut waiters: WaitingClients<u8> = WaitingClients::new(None);
        let receivers: Vec<_> = (0..100).map(|_| waiters.push().unwrap()).collect();
        assert_eq!(receivers.len(), 100);
        assert_eq!(waiters.len(), 100);
    }

    #[test]
    fn test_pop_front_is_fifo() {
        let mut waiters = WaitingClients::new(None);
        let (_, mut first) = waiters.push().unwrap();
        let (_, mut second) = waiters.push().unwrap();

        let id = ResourceId::new();
        let sender = waiters.pop_front().unwrap();
        assert!(sender.send(Ok(Lease { id, payload: 1 })).is_ok());

        let delivered = first.try_recv().unwrap().unwrap();
        assert_eq!(delivered.id, id);
        assert!(second.try_recv().is_err());
        assert_eq!(waiters.len(), 1);
    }

    #[test]
    fn test_remove_by_ticket() {
        let mut waiters: WaitingClients<u8> = WaitingClients::new(None);
        let (first, _rx1) = waiters.push().unwrap();
        let (second, _rx2) = waiters.push().unwrap();

        assert!(waiters.remove(first));
        assert!(!waiters.remove(first));
        assert_eq!(waiters.len(), 1);

        waiters.pop_front();
        assert!(!waiters.remove(second));
        assert_eq!(waiters.len(), 0);
    }

    #[test]
    fn test_close_all_signals_no_value() {
        let mut waiters: WaitingClients<u8> = WaitingClients::new(None);
        let (_, mut receiver) = waiters.push().unwrap();

        assert_eq!(waiters.close_all(), 1);
        assert_eq!(waiters.len(), 0);
        assert!(matches!(
            receiver.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
    }
}
