//! Tessera Engine - Main entry point.

use std::sync::Arc;

use anyhow::Context;
use tessera_events::EntityId;
use tessera_engine::config::{load_dotenv_from_repo_root, EngineConfig};
use tessera_engine::infrastructure::clock::SystemClock;
use tessera_engine::{telemetry, App};

fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;
    telemetry::init(&config.log_filter);

    tracing::info!(
        frames = config.frames,
        width = config.screen_width,
        height = config.screen_height,
        "Starting Tessera Engine"
    );

    let frames = config.frames;
    let mut app = App::bootstrap(config, Arc::new(SystemClock::new()))
        .context("Failed to bootstrap engine")?;
    let mut scene = Scene::default();

    for frame in 0..frames {
        scene.step(&app, frame)?;
        let report = app.tick();
        tracing::info!(
            frame = report.frame,
            events = report.events_handled(),
            viewport = ?report.viewport,
            components = report.live_components,
            contacts = report.active_contacts,
            "Frame"
        );
    }

    app.shutdown();
    Ok(())
}

/// A small scripted scene: a player walks into a crate, the window grows, and
/// the crate is destroyed.
#[derive(Default)]
struct Scene {
    player: Option<EntityId>,
    prop: Option<EntityId>,
}

impl Scene {
    fn step(&mut self, app: &App, frame: u64) -> anyhow::Result<()> {
        let world = app.world();
        match (frame % 6, self.player, self.prop) {
            (0, None, _) => {
                let player = world.spawn();
                world.attach(player, "Transform")?;
                world.attach(player, "Sprite")?;
                world.attach(player, "Body")?;
                self.player = Some(player);
                app.ui().mount("hud");
            }
            (1, _, None) => {
                let prop = world.spawn();
                world.attach(prop, "Transform")?;
                world.attach(prop, "Body")?;
                self.prop = Some(prop);
            }
            (2, Some(player), Some(prop)) => {
                world.begin_contact(player, prop)?;
            }
            (3, _, _) => {
                let (width, height) = app.screen().size();
                app.screen().resize(width + width / 4, height + height / 4);
            }
            (4, Some(player), Some(prop)) => {
                world.end_contact(player, prop)?;
                world.detach(player, "Sprite")?;
            }
            (5, _, Some(prop)) => {
                world.despawn(prop)?;
                self.prop = None;
            }
            _ => {}
        }
        Ok(())
    }
}
