//! Tessera Events - ordered event queues with independent subscriber cursors.
//!
//! A [`Queue`] is an append-only log read by any number of subscribers, each
//! at its own pace. Events already consumed by every live subscriber are
//! compacted off the front, so memory tracks the slowest reader rather than
//! the total traffic.
//!
//! ## Main Types
//!
//! - [`Queue`]: the log itself, owned by one producer
//! - [`Subscriber`]: an opaque cursor handle
//! - [`EventChannel`]: a cloneable, thread-safe handle for sharing a queue
//! - [`topics`]: payloads for the engine's built-in topics
//!
//! ```
//! use tessera_events::Queue;
//!
//! let mut resizes = Queue::named("screen.resize");
//! resizes.send((640, 480));
//! let viewport = resizes.subscribe();
//! resizes.send((800, 600));
//!
//! let seen: Vec<_> = resizes.read(viewport).collect();
//! assert_eq!(seen, vec![(800, 600)]);
//! assert_eq!(resizes.len(), 0);
//! ```

mod channel;
mod queue;
pub mod topics;

pub use channel::EventChannel;
pub use queue::{Queue, QueueStats, Read, Subscriber};
pub use topics::{ComponentEvent, ContactEvent, EntityId, ScreenResized, UiRootRegistered};
