//! Single-writer, multi-reader event queue.
//!
//! Each subscriber owns a cursor into the queue and only ever sees events sent
//! after it subscribed. Events are appended at the back and compacted off the
//! front once every live subscriber has read past them.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

/// Handle to a read cursor on a [`Queue`].
///
/// Handles are plain ids; they hold no reference into the queue and cannot
/// corrupt it. Ids are unique across every queue in the process, so a handle
/// used on a queue that never issued it reads nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscriber(u64);

static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(0);

impl Subscriber {
    fn issue() -> Self {
        Self(NEXT_SUBSCRIBER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    subscriber: Subscriber,
    offset: usize,
}

/// Counters describing a queue's lifetime traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Events appended with [`Queue::send`].
    pub sent: u64,
    /// Shrink passes run, including passes that removed nothing.
    pub compactions: u64,
    /// Events physically removed by compaction.
    pub discarded: u64,
}

/// Ordered event log with independent per-subscriber cursors.
pub struct Queue<T> {
    topic: &'static str,
    events: Vec<T>,
    cursors: Vec<Cursor>,
    backlog_warning: Option<usize>,
    backlog_warned: bool,
    stats: QueueStats,
}

impl<T> Queue<T> {
    /// Create a queue whose topic name is the payload type name.
    pub fn new() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Create a queue with an explicit topic name used in log fields.
    pub fn named(topic: &'static str) -> Self {
        Self {
            topic,
            events: Vec::new(),
            cursors: Vec::new(),
            backlog_warning: None,
            backlog_warned: false,
            stats: QueueStats::default(),
        }
    }

    /// Warn when compaction leaves more than `limit` events behind.
    pub fn with_backlog_warning(mut self, limit: usize) -> Self {
        self.backlog_warning = Some(limit);
        self
    }

    pub fn set_backlog_warning(&mut self, limit: Option<usize>) {
        self.backlog_warning = limit;
        self.backlog_warned = false;
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }

    /// Append an event. No cursor moves.
    pub fn send(&mut self, event: T) {
        self.events.push(event);
        self.stats.sent += 1;
    }

    /// Register a new cursor positioned at the current end of the queue.
    pub fn subscribe(&mut self) -> Subscriber {
        let subscriber = Subscriber::issue();

        let offset = self.events.len();
        self.cursors.push(Cursor { subscriber, offset });

        debug!(
            topic = self.topic,
            subscriber = subscriber.0,
            offset,
            "Subscribed to event queue"
        );
        subscriber
    }

    /// Drop a cursor from the live set and compact.
    ///
    /// Returns `false` if the subscriber was not live on this queue.
    pub fn unsubscribe(&mut self, subscriber: Subscriber) -> bool {
        let Some(slot) = self.slot(subscriber) else {
            return false;
        };
        self.cursors.swap_remove(slot);

        debug!(
            topic = self.topic,
            subscriber = subscriber.0,
            remaining = self.cursors.len(),
            "Unsubscribed from event queue"
        );
        self.shrink();
        true
    }

    pub fn is_subscribed(&self, subscriber: Subscriber) -> bool {
        self.slot(subscriber).is_some()
    }

    /// Number of events the subscriber has not consumed yet.
    pub fn pending(&self, subscriber: Subscriber) -> usize {
        self.slot(subscriber)
            .map_or(0, |slot| self.events.len() - self.cursors[slot].offset)
    }

    /// Take the next unread event for `subscriber`, then compact.
    ///
    /// Returns `None` when the subscriber is caught up (or unknown); the cursor
    /// does not move in that case.
    pub fn next(&mut self, subscriber: Subscriber) -> Option<T>
    where
        T: Clone,
    {
        let slot = self.slot(subscriber)?;
        let event = self.events.get(self.cursors[slot].offset).cloned()?;
        self.cursors[slot].offset += 1;
        self.shrink();
        Some(event)
    }

    /// Lazily yield every unread event for `subscriber`.
    ///
    /// The cursor advances as events are yielded. The queue is compacted once,
    /// when the iterator is exhausted or dropped.
    pub fn read(&mut self, subscriber: Subscriber) -> Read<'_, T> {
        let slot = self.slot(subscriber);
        Read {
            queue: self,
            slot,
            finished: false,
        }
    }

    /// Remove every event already consumed by all live subscribers.
    ///
    /// Cursors are rebased so each still refers to the same logical event.
    /// With no live subscribers nothing is removed. Returns the number of
    /// events removed.
    pub fn shrink(&mut self) -> usize {
        self.stats.compactions += 1;

        let floor = self
            .cursors
            .iter()
            .map(|cursor| cursor.offset)
            .min()
            .unwrap_or(0);

        if floor > 0 {
            self.events.drain(..floor);
            for cursor in &mut self.cursors {
                cursor.offset -= floor;
            }
            self.stats.discarded += floor as u64;
            trace!(topic = self.topic, removed = floor, "Compacted event queue");
        }

        self.check_backlog();
        floor
    }

    /// Current queue contents, oldest first.
    pub fn events(&self) -> &[T] {
        &self.events
    }

    /// Empty the queue and rewind every cursor to the start.
    pub fn clear(&mut self) {
        self.events.clear();
        for cursor in &mut self.cursors {
            cursor.offset = 0;
        }
        self.backlog_warned = false;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.cursors.len()
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    fn slot(&self, subscriber: Subscriber) -> Option<usize> {
        self.cursors
            .iter()
            .position(|cursor| cursor.subscriber == subscriber)
    }

    fn check_backlog(&mut self) {
        let Some(limit) = self.backlog_warning else {
            return;
        };

        let backlog = self.events.len();
        if backlog <= limit {
            self.backlog_warned = false;
            return;
        }
        if self.backlog_warned {
            return;
        }
        self.backlog_warned = true;

        // After compaction the subscribers holding the floor sit at offset 0.
        let lagging = self
            .cursors
            .iter()
            .filter(|cursor| cursor.offset == 0)
            .count();
        warn!(
            topic = self.topic,
            backlog,
            limit,
            lagging,
            subscribers = self.cursors.len(),
            "Event queue backlog over limit, a subscriber may have been abandoned"
        );
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("topic", &self.topic)
            .field("len", &self.events.len())
            .field("subscribers", &self.cursors.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Draining iterator returned by [`Queue::read`].
pub struct Read<'a, T> {
    queue: &'a mut Queue<T>,
    slot: Option<usize>,
    finished: bool,
}

impl<T> Read<'_, T> {
    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.queue.shrink();
        }
    }
}

impl<T: Clone> Iterator for Read<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }

        if let Some(slot) = self.slot {
            let offset = self.queue.cursors[slot].offset;
            if let Some(event) = self.queue.events.get(offset) {
                let event = event.clone();
                self.queue.cursors[slot].offset += 1;
                return Some(event);
            }
        }

        self.finish();
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match (self.finished, self.slot) {
            (false, Some(slot)) => self.queue.events.len() - self.queue.cursors[slot].offset,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl<T: Clone> FusedIterator for Read<'_, T> {}

impl<T> Drop for Read<'_, T> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_only_see_events_sent_after_subscribing() {
        let mut queue = Queue::named("test");
        queue.send('A');
        let first = queue.subscribe();
        queue.send('B');
        let second = queue.subscribe();
        queue.send('C');

        assert_eq!(queue.next(first), Some('B'));
        assert_eq!(queue.next(first), Some('C'));
        assert_eq!(queue.next(first), None);

        assert_eq!(queue.next(second), Some('C'));
        assert_eq!(queue.next(second), None);
    }

    #[test]
    fn shrink_drops_events_before_the_slowest_cursor() {
        let mut queue = Queue::named("test");
        queue.send('A');
        queue.send('B');
        let subscriber = queue.subscribe();
        queue.send('C');

        assert_eq!(queue.shrink(), 2);
        assert_eq!(queue.events(), &['C']);
        assert_eq!(queue.next(subscriber), Some('C'));
    }

    #[test]
    fn shrink_rebases_cursors_onto_the_same_logical_event() {
        let mut queue = Queue::named("test");
        let fast = queue.subscribe();
        let slow = queue.subscribe();
        for n in 0..5 {
            queue.send(n);
        }

        assert_eq!(queue.next(fast), Some(0));
        assert_eq!(queue.next(fast), Some(1));
        assert_eq!(queue.next(fast), Some(2));
        assert_eq!(queue.next(slow), Some(0));

        // slow holds the floor at logical event 1
        assert_eq!(queue.events(), &[1, 2, 3, 4]);
        assert_eq!(queue.next(slow), Some(1));
        assert_eq!(queue.next(fast), Some(3));
        assert_eq!(queue.pending(slow), 3);
        assert_eq!(queue.pending(fast), 1);
    }

    #[test]
    fn shrink_without_subscribers_keeps_everything() {
        let mut queue = Queue::named("test");
        queue.send(1);
        queue.send(2);

        assert_eq!(queue.shrink(), 0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn read_drains_in_order_and_shrinks_once() {
        let mut queue = Queue::named("test");
        let subscriber = queue.subscribe();
        for n in 0..10 {
            queue.send(n);
        }
        let before = queue.stats().compactions;

        let drained: Vec<_> = queue.read(subscriber).collect();

        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert_eq!(queue.stats().compactions, before + 1);
        assert!(queue.is_empty());
        assert_eq!(queue.stats().discarded, 10);
    }

    #[test]
    fn read_dropped_early_keeps_the_rest_for_the_next_call() {
        let mut queue = Queue::named("test");
        let subscriber = queue.subscribe();
        for n in 0..4 {
            queue.send(n);
        }
        let before = queue.stats().compactions;

        let first_two: Vec<_> = queue.read(subscriber).take(2).collect();
        assert_eq!(first_two, vec![0, 1]);
        assert_eq!(queue.stats().compactions, before + 1);

        let rest: Vec<_> = queue.read(subscriber).collect();
        assert_eq!(rest, vec![2, 3]);
    }

    #[test]
    fn read_reports_exact_size() {
        let mut queue = Queue::named("test");
        let subscriber = queue.subscribe();
        queue.send("a");
        queue.send("b");

        let mut read = queue.read(subscriber);
        assert_eq!(read.size_hint(), (2, Some(2)));
        read.next();
        assert_eq!(read.size_hint(), (1, Some(1)));
    }

    #[test]
    fn unknown_subscriber_reads_nothing() {
        let mut other = Queue::<u8>::named("other");
        let foreign = other.subscribe();
        let _ = other.subscribe();
        let foreign_late = other.subscribe();

        let mut queue = Queue::named("test");
        let _ = queue.subscribe();
        queue.send(7u8);

        assert!(!queue.is_subscribed(foreign_late));
        assert_eq!(queue.next(foreign_late), None);
        assert_eq!(queue.read(foreign_late).count(), 0);
        assert_eq!(queue.pending(foreign_late), 0);
        assert!(!queue.is_subscribed(foreign));
    }

    #[test]
    fn handle_from_another_queue_cannot_steal_events() {
        let mut resizes = Queue::<u32>::named("screen.resized");
        let viewport = resizes.subscribe();

        let mut contacts = Queue::named("world.contacts");
        let physics = contacts.subscribe();
        contacts.send(42u32);

        assert_ne!(viewport, physics);
        assert_eq!(contacts.next(viewport), None);
        assert!(!contacts.unsubscribe(viewport));
        assert_eq!(contacts.next(physics), Some(42));
        assert_eq!(resizes.pending(viewport), 0);
    }

    #[test]
    fn abandoned_subscriber_pins_the_queue_until_unsubscribed() {
        let mut queue = Queue::named("test");
        let abandoned = queue.subscribe();
        let active = queue.subscribe();
        for n in 0..3 {
            queue.send(n);
        }

        assert_eq!(queue.read(active).count(), 3);
        assert_eq!(queue.len(), 3);

        assert!(queue.unsubscribe(abandoned));
        assert!(queue.is_empty());
        assert_eq!(queue.subscriber_count(), 1);
        assert!(!queue.unsubscribe(abandoned));
    }

    #[test]
    fn unsubscribe_keeps_other_cursors_intact() {
        let mut queue = Queue::named("test");
        let a = queue.subscribe();
        let b = queue.subscribe();
        let c = queue.subscribe();
        queue.send('x');
        queue.send('y');
        assert_eq!(queue.next(c), Some('x'));

        assert!(queue.unsubscribe(a));

        assert_eq!(queue.next(b), Some('x'));
        assert_eq!(queue.next(c), Some('y'));
        assert_eq!(queue.next(b), Some('y'));
        assert_eq!(queue.next(b), None);
    }

    #[test]
    fn clear_empties_and_rewinds_cursors() {
        let mut queue = Queue::named("test");
        let subscriber = queue.subscribe();
        queue.send(1);
        queue.send(2);
        queue.next(subscriber);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pending(subscriber), 0);

        queue.send(3);
        assert_eq!(queue.next(subscriber), Some(3));
    }

    #[test]
    fn backlog_warning_rearms_after_draining() {
        let mut queue = Queue::named("test").with_backlog_warning(2);
        let stuck = queue.subscribe();
        let reader = queue.subscribe();
        for n in 0..4 {
            queue.send(n);
        }

        queue.read(reader).for_each(drop);
        assert!(queue.backlog_warned);

        queue.read(stuck).for_each(drop);
        assert!(!queue.backlog_warned);
    }

    #[test]
    fn stats_count_sent_events() {
        let mut queue = Queue::named("test");
        queue.send(());
        queue.send(());
        assert_eq!(queue.stats().sent, 2);
        assert_eq!(queue.stats().discarded, 0);
    }
}
