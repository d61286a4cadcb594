//! Engine services shared through the container.

pub mod screen;
pub mod ui;
pub mod world;

pub use screen::Screen;
pub use ui::UiRoot;
pub use world::{World, WorldError};
