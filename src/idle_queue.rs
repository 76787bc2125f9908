//! FIFO container for idle resources
//!
//! Not synchronized. The pool only touches it while holding its lock.

use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct IdleQueue<T> {
    items: VecDeque<T>,
}

impl<T> IdleQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove the item that has been idle the longest
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }
}
