//! Bounded inbound line queue.
//!
//! The reader never blocks on a full queue: the oldest line is dropped and
//! the newest kept.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

/// Drop-oldest FIFO of framed lines.
#[derive(Debug)]
pub struct LineQueue {
    lines: Mutex<VecDeque<Vec<u8>>>,
    capacity: usize,
    available: Notify,
    dropped: AtomicU64,
}

impl LineQueue {
    /// Create a queue holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            available: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    fn lines(&self) -> MutexGuard<'_, VecDeque<Vec<u8>>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line, evicting the oldest if full.
    ///
    /// Returns `true` if a line was evicted.
    pub fn push(&self, line: Vec<u8>) -> bool {
        let evicted = {
            let mut lines = self.lines();
            let evicted = if lines.len() >= self.capacity {
                lines.pop_front();
                true
            } else {
                false
            };
            lines.push_back(line);
            evicted
        };
        if evicted {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(capacity = self.capacity, dropped = total, "line queue full, dropped oldest");
        }
        self.available.notify_one();
        evicted
    }

    /// Take the oldest line, if any.
    pub fn try_pop(&self) -> Option<Vec<u8>> {
        self.lines().pop_front()
    }

    /// Take the oldest line, waiting up to `timeout` for one to arrive.
    ///
    /// Intended for a single consumer.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(line) = self.try_pop() {
                return Some(line);
            }
            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return self.try_pop();
            }
        }
    }

    /// Discard every buffered line.
    pub fn clear(&self) {
        self.lines().clear();
    }

    /// Buffered line count.
    pub fn len(&self) -> usize {
        self.lines().len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    /// Maximum buffered lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
