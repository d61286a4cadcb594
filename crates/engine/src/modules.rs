//! The engine's modules.
//!
//! `CoreModule` carries the runtime inputs (config, clock) and one channel per
//! event topic. `ScreenModule` and `WorldModule` import it; `UiModule` imports
//! both `CoreModule` and `ScreenModule`.

use std::sync::Arc;

use tessera_events::{
    ComponentEvent, ContactEvent, EventChannel, Queue, ScreenResized, UiRootRegistered,
};
use tessera_inject::{Arguments, ContainerError, Injectable, InjectionMetadata, Token};
use tessera_modules::{ModuleDefinition, ModuleDescriptor, ModuleRegistry};

use crate::config::EngineConfig;
use crate::infrastructure::ClockPort;
use crate::services::{Screen, UiRoot, World};

pub const SCREEN_TOPIC: &str = "screen.resized";
pub const COMPONENT_TOPIC: &str = "world.components";
pub const CONTACT_TOPIC: &str = "world.contacts";
pub const UI_TOPIC: &str = "ui.roots";

/// Token of the shared clock. The bound value is an `Arc<dyn ClockPort>`.
pub fn clock_token() -> Token {
    Token::of::<dyn ClockPort>()
}

/// Registry holding every engine module.
pub fn engine_registry(config: &EngineConfig, clock: Arc<dyn ClockPort>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.insert(CoreModule::descriptor(config, clock));
    registry
        .register::<ScreenModule>()
        .register::<WorldModule>()
        .register::<UiModule>();
    registry
}

pub struct CoreModule;

impl CoreModule {
    /// Built per run since it wraps runtime values.
    pub fn descriptor(config: &EngineConfig, clock: Arc<dyn ClockPort>) -> ModuleDescriptor {
        let descriptor = ModuleDescriptor::of::<Self>()
            .provide_value(Token::of::<EngineConfig>(), config.clone())
            .provide_value(clock_token(), clock)
            .export_type::<EngineConfig>()
            .export(clock_token());

        let descriptor = with_topic::<ScreenResized>(descriptor, SCREEN_TOPIC, config);
        let descriptor = with_topic::<ComponentEvent>(descriptor, COMPONENT_TOPIC, config);
        let descriptor = with_topic::<ContactEvent>(descriptor, CONTACT_TOPIC, config);
        with_topic::<UiRootRegistered>(descriptor, UI_TOPIC, config)
    }
}

impl Injectable for CoreModule {
    fn construct(_: Arguments) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

/// Provide and export a fresh channel for topic `T`.
fn with_topic<T: Send + 'static>(
    descriptor: ModuleDescriptor,
    topic: &'static str,
    config: &EngineConfig,
) -> ModuleDescriptor {
    let mut queue = Queue::<T>::named(topic);
    queue.set_backlog_warning(config.event_backlog_warning);

    descriptor
        .provide_value(Token::of::<EventChannel<T>>(), EventChannel::new(queue))
        .export_type::<EventChannel<T>>()
}

pub struct ScreenModule {
    screen: Arc<Screen>,
}

impl ScreenModule {
    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }
}

impl Injectable for ScreenModule {
    fn injection() -> Option<InjectionMetadata> {
        Some(InjectionMetadata::new().param::<Screen>())
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            screen: args.required()?,
        })
    }
}

impl ModuleDefinition for ScreenModule {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::of::<Self>()
            .import::<CoreModule>()
            .provide::<Screen>()
            .export_type::<Screen>()
    }
}

pub struct WorldModule {
    world: Arc<World>,
}

impl WorldModule {
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }
}

impl Injectable for WorldModule {
    fn injection() -> Option<InjectionMetadata> {
        Some(InjectionMetadata::new().param::<World>())
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        Ok(Self {
            world: args.required()?,
        })
    }
}

impl ModuleDefinition for WorldModule {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::of::<Self>()
            .import::<CoreModule>()
            .provide::<World>()
            .export_type::<World>()
    }
}

pub struct UiModule;

impl Injectable for UiModule {
    fn construct(_: Arguments) -> Result<Self, ContainerError> {
        Ok(Self)
    }
}

impl ModuleDefinition for UiModule {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::of::<Self>()
            .import::<CoreModule>()
            .import::<ScreenModule>()
            .provide::<UiRoot>()
            .export_type::<UiRoot>()
    }
}
