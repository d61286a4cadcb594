//! Shared handle to a [`Queue`] for producers and consumers living in
//! different services.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::queue::{Queue, QueueStats, Subscriber};

/// Cloneable handle to one event topic.
///
/// Clones refer to the same queue, so a channel can be bound once in a
/// container and handed to every system that sends or reads the topic.
pub struct EventChannel<T> {
    queue: Arc<Mutex<Queue<T>>>,
}

impl<T> EventChannel<T> {
    pub fn new(queue: Queue<T>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
        }
    }

    pub fn named(topic: &'static str) -> Self {
        Self::new(Queue::named(topic))
    }

    /// Lock the queue for batch work. Poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn send(&self, event: T) {
        self.lock().send(event);
    }

    pub fn subscribe(&self) -> Subscriber {
        self.lock().subscribe()
    }

    pub fn unsubscribe(&self, subscriber: Subscriber) -> bool {
        self.lock().unsubscribe(subscriber)
    }

    pub fn next(&self, subscriber: Subscriber) -> Option<T>
    where
        T: Clone,
    {
        self.lock().next(subscriber)
    }

    /// Collect every unread event for `subscriber`, compacting once.
    pub fn drain(&self, subscriber: Subscriber) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().read(subscriber).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats()
    }

    pub fn topic(&self) -> &'static str {
        self.lock().topic()
    }

    /// True if both handles point at the same queue.
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue)
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new(Queue::new())
    }
}

impl<T> std::fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EventChannel").field(&*self.lock()).finish()
    }
}
