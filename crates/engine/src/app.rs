//! Application state and composition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tessera_events::{ComponentEvent, ContactEvent, EventChannel, ScreenResized, UiRootRegistered};
use tessera_inject::TypeKey;
use tessera_modules::{ModuleError, ModuleFactory, ModuleSource};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::infrastructure::ClockPort;
use crate::modules::{clock_token, engine_registry, CoreModule, ScreenModule, UiModule, WorldModule};
use crate::services::{Screen, UiRoot, World};
use crate::systems::{
    ComponentIndexSystem, ContactSystem, FrameSystem, UiRootSystem, ViewportSystem,
};

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub started_at: DateTime<Utc>,
    /// Events handled per system, in run order.
    pub handled: Vec<(&'static str, usize)>,
    pub viewport: (u32, u32),
    pub live_components: usize,
    pub active_contacts: usize,
}

impl FrameReport {
    pub fn events_handled(&self) -> usize {
        self.handled.iter().map(|(_, count)| count).sum()
    }
}

/// Services resolved from the global container.
pub struct Services {
    pub screen: Arc<Screen>,
    pub world: Arc<World>,
    pub ui: Arc<UiRoot>,
}

/// Frame systems, run in field order.
pub struct Systems {
    pub viewport: ViewportSystem,
    pub components: ComponentIndexSystem,
    pub contacts: ContactSystem,
    pub ui_roots: UiRootSystem,
}

impl Systems {
    fn in_order(&mut self) -> [&mut dyn FrameSystem; 4] {
        [
            &mut self.viewport,
            &mut self.components,
            &mut self.contacts,
            &mut self.ui_roots,
        ]
    }
}

/// Main application state.
///
/// Owns the module factory, so every module and the global container live as
/// long as the app.
pub struct App {
    factory: ModuleFactory,
    clock: Arc<dyn ClockPort>,
    pub services: Services,
    pub systems: Systems,
    frame: u64,
}

impl App {
    /// Realize the engine modules and subscribe the frame systems.
    pub fn bootstrap(config: EngineConfig, clock: Arc<dyn ClockPort>) -> Result<Self, ModuleError> {
        let registry = engine_registry(&config, clock);
        let mut factory = ModuleFactory::new(registry);

        let created = factory.create_all([
            ModuleSource::class::<UiModule>(),
            ModuleSource::class::<WorldModule>(),
            ModuleSource::class::<ScreenModule>(),
            ModuleSource::class::<CoreModule>(),
        ])?;
        info!(
            modules = ?created.iter().map(TypeKey::short_name).collect::<Vec<_>>(),
            "Engine modules created"
        );

        let global = factory.global();
        let clock = global
            .resolve::<Arc<dyn ClockPort>>(&clock_token())?
            .as_ref()
            .clone();
        let services = Services {
            screen: global.get_type::<Screen>()?,
            world: global.get_type::<World>()?,
            ui: global.get_type::<UiRoot>()?,
        };
        let systems = Systems {
            viewport: ViewportSystem::new(
                global.get_type::<EventChannel<ScreenResized>>()?.as_ref().clone(),
                services.screen.size(),
            ),
            components: ComponentIndexSystem::new(
                global.get_type::<EventChannel<ComponentEvent>>()?.as_ref().clone(),
            ),
            contacts: ContactSystem::new(
                global.get_type::<EventChannel<ContactEvent>>()?.as_ref().clone(),
            ),
            ui_roots: UiRootSystem::new(
                global.get_type::<EventChannel<UiRootRegistered>>()?.as_ref().clone(),
            ),
        };

        Ok(Self {
            factory,
            clock,
            services,
            systems,
            frame: 0,
        })
    }

    pub fn factory(&self) -> &ModuleFactory {
        &self.factory
    }

    /// The clock exported by `CoreModule`.
    pub fn clock(&self) -> &Arc<dyn ClockPort> {
        &self.clock
    }

    pub fn world(&self) -> &Arc<World> {
        &self.services.world
    }

    pub fn screen(&self) -> &Arc<Screen> {
        &self.services.screen
    }

    pub fn ui(&self) -> &Arc<UiRoot> {
        &self.services.ui
    }

    /// Frames completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run every system once, in order.
    pub fn tick(&mut self) -> FrameReport {
        let started_at = self.clock.now();
        let handled = self
            .systems
            .in_order()
            .into_iter()
            .map(|system| (system.name(), system.run()))
            .collect();

        let report = FrameReport {
            frame: self.frame,
            started_at,
            handled,
            viewport: self.systems.viewport.size(),
            live_components: self.systems.components.total(),
            active_contacts: self.systems.contacts.active_count(),
        };
        self.frame += 1;

        debug!(
            frame = report.frame,
            events = report.events_handled(),
            "Frame complete"
        );
        report
    }

    /// Release every subscription. Safe to call twice.
    pub fn shutdown(&mut self) {
        for system in self.systems.in_order() {
            system.teardown();
        }
        info!(frames = self.frame, "Engine stopped");
    }
}
