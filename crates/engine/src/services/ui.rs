//! UI trees mounted over the screen.

use std::sync::{Arc, Mutex, PoisonError};

use tessera_events::{EntityId, EventChannel, UiRootRegistered};
use tessera_inject::{Arguments, ContainerError, Injectable, InjectionMetadata};
use tracing::info;

use crate::services::screen::Screen;

/// Named UI trees laid out over the screen.
pub struct UiRoot {
    screen: Arc<Screen>,
    roots: Mutex<Vec<(EntityId, String)>>,
    registered: EventChannel<UiRootRegistered>,
}

impl UiRoot {
    pub fn new(screen: Arc<Screen>, registered: EventChannel<UiRootRegistered>) -> Self {
        Self {
            screen,
            roots: Mutex::new(Vec::new()),
            registered,
        }
    }

    /// Mount a new UI tree and announce it.
    pub fn mount(&self, name: impl Into<String>) -> EntityId {
        let entity = EntityId::new();
        let name = name.into();
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((entity, name.clone()));

        info!(entity = %entity, name = %name, "UI root mounted");
        self.registered.send(UiRootRegistered { entity, name });
        entity
    }

    pub fn roots(&self) -> Vec<(EntityId, String)> {
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Area available to every root.
    pub fn layout_size(&self) -> (u32, u32) {
        self.screen.size()
    }
}

impl Injectable for UiRoot {
    fn injection() -> Option<InjectionMetadata> {
        Some(
            InjectionMetadata::new()
                .param::<Screen>()
                .param::<EventChannel<UiRootRegistered>>(),
        )
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self::new(args.required()?, args.value()?))
    }
}
