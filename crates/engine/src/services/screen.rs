//! The render surface.

use std::sync::{Arc, Mutex, PoisonError};

use tessera_events::{EventChannel, ScreenResized};
use tessera_inject::{Arguments, ContainerError, Injectable, InjectionMetadata};
use tracing::debug;

use crate::config::EngineConfig;

/// Current surface size. Every change is published as [`ScreenResized`].
pub struct Screen {
    size: Mutex<(u32, u32)>,
    resized: EventChannel<ScreenResized>,
}

impl Screen {
    pub fn new(width: u32, height: u32, resized: EventChannel<ScreenResized>) -> Self {
        Self {
            size: Mutex::new((width, height)),
            resized,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the size. Returns false, and sends nothing, when it is unchanged
    /// or degenerate.
    pub fn resize(&self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            debug!(width, height, "Ignoring degenerate resize");
            return false;
        }

        let mut size = self.size.lock().unwrap_or_else(PoisonError::into_inner);
        if *size == (width, height) {
            return false;
        }
        *size = (width, height);
        drop(size);

        self.resized.send(ScreenResized { width, height });
        true
    }
}

impl Injectable for Screen {
    fn injection() -> Option<InjectionMetadata> {
        Some(
            InjectionMetadata::new()
                .param::<EngineConfig>()
                .param::<EventChannel<ScreenResized>>(),
        )
    }

    fn construct(mut args: Arguments) -> Result<Self, ContainerError> {
        let config: Arc<EngineConfig> = args.required()?;
        let resized = args.value::<EventChannel<ScreenResized>>()?;
        if config.screen_width == 0 || config.screen_height == 0 {
            return Err(ContainerError::construction::<Self>("screen size must be positive"));
        }
        Ok(Self::new(config.screen_width, config.screen_height, resized))
    }
}
