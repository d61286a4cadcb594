//! Tessera Engine library.
//!
//! The composition root: it turns the event queues, the container and the
//! module factory into a running frame loop.
//!
//! ## Structure
//!
//! - `config` - Environment-driven settings
//! - `infrastructure/` - Ports and their adapters (clock)
//! - `services/` - Screen, world and UI state shared through the container
//! - `modules` - Module descriptors wiring the services together
//! - `systems` - Per-frame event consumers
//! - `app` - Bootstrap and the frame loop

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod modules;
pub mod services;
pub mod systems;
pub mod telemetry;

pub use app::{App, FrameReport};
pub use config::EngineConfig;
