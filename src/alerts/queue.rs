//! Two-band priority queue with a lockable low band.

use std::{collections::VecDeque, sync::Arc};

use tokio::sync::Notify;

/// Priority band of a queued element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    /// Ordinary alerts, suppressed while the queue is locked
    #[default]
    Low,
    /// Time-critical alerts, never subject to the lock
    Critical,
}

/// FIFO buffer split into a low and a critical band.
///
/// Critical elements always pop before low ones. Locking the queue only suppresses pops
/// from the low band: pushes are always accepted and critical elements keep flowing.
///
/// Every push notifies subscribers through a shared [`Notify`]. Notifications coalesce
/// and must only be treated as a wake-up hint.
///
/// # Examples
///
/// ```ignore
/// let mut queue = PriorityQueue::new();
/// queue.push("low", Priority::Low);
/// queue.push("critical", Priority::Critical);
///
/// queue.lock();
/// assert_eq!(queue.pop(), Some("critical"));
/// assert_eq!(queue.pop(), None);
///
/// queue.unlock();
/// assert_eq!(queue.pop(), Some("low"));
/// ```
pub struct PriorityQueue<T> {
    low: VecDeque<T>,
    critical: VecDeque<T>,
    locked: bool,
    /// Wakes subscribers when elements become available
    waker: Arc<Notify>,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        PriorityQueue {
            low: VecDeque::new(),
            critical: VecDeque::new(),
            locked: false,
            waker: Arc::new(Notify::new()),
        }
    }

    /// Returns the notifier signalled on every push.
    pub fn subscribe(&self) -> Arc<Notify> {
        Arc::clone(&self.waker)
    }

    /// Appends an element to the band named by `priority` and notifies subscribers.
    pub fn push(&mut self, element: T, priority: Priority) {
        match priority {
            Priority::Low => self.low.push_back(element),
            Priority::Critical => self.critical.push_back(element),
        }
        self.waker.notify_one();
    }

    /// Removes the head of the critical band, or the head of the low band when the
    /// critical band is empty and the queue is not locked.
    pub fn pop(&mut self) -> Option<T> {
        if let Some(element) = self.critical.pop_front() {
            return Some(element);
        }
        if self.locked {
            return None;
        }
        self.low.pop_front()
    }

    /// Suppresses pops from the low band.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Allows pops from the low band again.
    ///
    /// Subscribers are notified when the unlock releases pending low elements.
    pub fn unlock(&mut self) {
        let was_locked = self.locked;
        self.locked = false;
        if was_locked && !self.low.is_empty() {
            self.waker.notify_one();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns `true` when both bands are empty, regardless of the lock.
    pub fn is_empty(&self) -> bool {
        self.low.is_empty() && self.critical.is_empty()
    }

    /// Number of elements across both bands.
    pub fn len(&self) -> usize {
        self.low.len() + self.critical.len()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
