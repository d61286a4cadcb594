//! Frame systems.
//!
//! Each system owns one subscription and drains it once per frame. Draining
//! compacts the topic, so a system that stops running must be torn down or it
//! pins every later event in memory.

use std::collections::{BTreeMap, BTreeSet};

use tessera_events::{
    ComponentEvent, ContactEvent, EntityId, EventChannel, ScreenResized, Subscriber,
    UiRootRegistered,
};
use tracing::debug;

pub trait FrameSystem {
    fn name(&self) -> &'static str;

    /// Consume pending events. Returns how many were handled.
    fn run(&mut self) -> usize;

    /// Drop the subscription. Later runs handle nothing.
    fn teardown(&mut self);

    fn is_active(&self) -> bool;
}

/// One subscription to a channel, released on teardown.
struct Subscription<T> {
    channel: EventChannel<T>,
    subscriber: Option<Subscriber>,
}

impl<T: Clone> Subscription<T> {
    fn new(channel: EventChannel<T>) -> Self {
        let subscriber = Some(channel.subscribe());
        Self {
            channel,
            subscriber,
        }
    }

    fn drain(&self) -> Vec<T> {
        self.subscriber
            .map(|subscriber| self.channel.drain(subscriber))
            .unwrap_or_default()
    }

    fn cancel(&mut self) {
        if let Some(subscriber) = self.subscriber.take() {
            self.channel.unsubscribe(subscriber);
        }
    }
}

/// Tracks the latest screen size.
pub struct ViewportSystem {
    resized: Subscription<ScreenResized>,
    size: (u32, u32),
    resizes: u64,
}

impl ViewportSystem {
    pub fn new(resized: EventChannel<ScreenResized>, initial: (u32, u32)) -> Self {
        Self {
            resized: Subscription::new(resized),
            size: initial,
            resizes: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.size.0 as f32 / self.size.1.max(1) as f32
    }

    /// Resize events seen since creation.
    pub fn resizes(&self) -> u64 {
        self.resizes
    }
}

impl FrameSystem for ViewportSystem {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn run(&mut self) -> usize {
        let events = self.resized.drain();
        if let Some(last) = events.last() {
            self.size = (last.width, last.height);
            self.resizes += events.len() as u64;
            debug!(width = last.width, height = last.height, "Viewport updated");
        }
        events.len()
    }

    fn teardown(&mut self) {
        self.resized.cancel();
    }

    fn is_active(&self) -> bool {
        self.resized.subscriber.is_some()
    }
}

/// Live component counts per kind.
pub struct ComponentIndexSystem {
    components: Subscription<ComponentEvent>,
    counts: BTreeMap<String, usize>,
}

impl ComponentIndexSystem {
    pub fn new(components: EventChannel<ComponentEvent>) -> Self {
        Self {
            components: Subscription::new(components),
            counts: BTreeMap::new(),
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }
}

impl FrameSystem for ComponentIndexSystem {
    fn name(&self) -> &'static str {
        "component-index"
    }

    fn run(&mut self) -> usize {
        let events = self.components.drain();
        for event in &events {
            match event {
                ComponentEvent::Added { component, .. } => {
                    *self.counts.entry(component.clone()).or_insert(0) += 1;
                }
                ComponentEvent::Removed { component, .. } => {
                    if let Some(count) = self.counts.get_mut(component) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            self.counts.remove(component);
                        }
                    }
                }
            }
        }
        events.len()
    }

    fn teardown(&mut self) {
        self.components.cancel();
    }

    fn is_active(&self) -> bool {
        self.components.subscriber.is_some()
    }
}

/// Pairs of entities currently touching.
pub struct ContactSystem {
    contacts: Subscription<ContactEvent>,
    active: BTreeSet<(EntityId, EntityId)>,
    begun: u64,
}

impl ContactSystem {
    pub fn new(contacts: EventChannel<ContactEvent>) -> Self {
        Self {
            contacts: Subscription::new(contacts),
            active: BTreeSet::new(),
            begun: 0,
        }
    }

    pub fn is_touching(&self, a: EntityId, b: EntityId) -> bool {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.active.contains(&pair)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Contacts begun since creation.
    pub fn begun(&self) -> u64 {
        self.begun
    }
}

impl FrameSystem for ContactSystem {
    fn name(&self) -> &'static str {
        "contacts"
    }

    fn run(&mut self) -> usize {
        let events = self.contacts.drain();
        for event in &events {
            match event {
                ContactEvent::Begin { .. } => {
                    if self.active.insert(event.pair()) {
                        self.begun += 1;
                    }
                }
                ContactEvent::End { .. } => {
                    self.active.remove(&event.pair());
                }
            }
        }
        events.len()
    }

    fn teardown(&mut self) {
        self.contacts.cancel();
    }

    fn is_active(&self) -> bool {
        self.contacts.subscriber.is_some()
    }
}

/// Names of mounted UI roots.
pub struct UiRootSystem {
    registered: Subscription<UiRootRegistered>,
    roots: Vec<String>,
}

impl UiRootSystem {
    pub fn new(registered: EventChannel<UiRootRegistered>) -> Self {
        Self {
            registered: Subscription::new(registered),
            roots: Vec::new(),
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl FrameSystem for UiRootSystem {
    fn name(&self) -> &'static str {
        "ui-roots"
    }

    fn run(&mut self) -> usize {
        let events = self.registered.drain();
        self.roots.extend(events.iter().map(|event| event.name.clone()));
        events.len()
    }

    fn teardown(&mut self) {
        self.registered.cancel();
    }

    fn is_active(&self) -> bool {
        self.registered.subscriber.is_some()
    }
}
